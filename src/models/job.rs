use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Top-level job classification. The role-based flow calls it a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub job_codes: Vec<JobCode>,
}

pub type Role = JobCategory;

fn default_true() -> bool {
    true
}

impl JobCategory {
    pub fn has_job_codes(&self) -> bool {
        !self.job_codes.is_empty()
    }

    pub fn job_code(&self, id: i64) -> Option<&JobCode> {
        self.job_codes.iter().find(|jc| jc.id == id)
    }
}

/// Outcome of the two-level picker: a category and, optionally, one of its codes.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSelection {
    pub category: JobCategory,
    pub job_code: Option<JobCode>,
}

impl JobSelection {
    pub fn category(category: JobCategory) -> Self {
        Self {
            category,
            job_code: None,
        }
    }

    pub fn with_code(category: JobCategory, job_code: JobCode) -> Self {
        Self {
            category,
            job_code: Some(job_code),
        }
    }

    /// A selection is usable when its code (if any) belongs to the category
    /// and a category with codes is not picked without one.
    pub fn validate(&self) -> AppResult<()> {
        match &self.job_code {
            Some(code) if self.category.job_code(code.id).is_none() => {
                Err(AppError::Validation(format!(
                    "Job code '{}' does not belong to '{}'",
                    code.name, self.category.name
                )))
            }
            None if self.category.has_job_codes() => Err(AppError::Validation(format!(
                "Select a job code for '{}'",
                self.category.name
            ))),
            _ => Ok(()),
        }
    }

    /// Legacy clock endpoints take either a job code or a category, never both.
    pub fn clock_ids(&self) -> (Option<i64>, Option<i64>) {
        match &self.job_code {
            Some(code) => (None, Some(code.id)),
            None => (Some(self.category.id), None),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.job_code {
            Some(code) => format!("{} - {}", self.category.name, code.name),
            None => self.category.name.clone(),
        }
    }
}
