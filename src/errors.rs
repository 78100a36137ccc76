//! Unified application error type.
//! All modules (api, store, core, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Local store
    // ---------------------------
    #[error("Local store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Local store migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Validation (never reaches the network)
    // ---------------------------
    #[error("{0}")]
    Validation(String),

    #[error("Photo '{file}' rejected: {reason}")]
    PhotoRejected { file: String, reason: String },

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: String, state: String },

    #[error("Another {0} request is still pending")]
    Busy(String),

    // ---------------------------
    // Authentication
    // ---------------------------
    #[error("{0}")]
    InvalidPin(String),

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Admin API not configured on server")]
    AdminUnavailable,

    #[error("Not logged in as admin")]
    AdminLoggedOut,

    // ---------------------------
    // Backend
    // ---------------------------
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Shorthand used by the state machines when an action is not allowed.
    pub fn transition(action: &str, state: impl std::fmt::Display) -> Self {
        AppError::InvalidTransition {
            action: action.to_string(),
            state: state.to_string(),
        }
    }

    /// True for errors raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::PhotoRejected { .. }
                | AppError::InvalidTransition { .. }
                | AppError::Busy(_)
        )
    }

    /// 401/403 from the backend.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Api { status: 401 | 403, .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;
