use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntryPhoto {
    pub id: i64,
    pub time_entry: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

/// Image staged for upload. `content_type` is `None` when the platform could
/// not tell (camera-native formats usually arrive like that).
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
