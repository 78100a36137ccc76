use serde::{Deserialize, Serialize};

/// Colored label attached to sessions, either global or scoped to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: Option<i64>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub color: String,
}

fn default_true() -> bool {
    true
}

impl ActivityTag {
    pub fn is_global(&self) -> bool {
        self.role.is_none()
    }
}
