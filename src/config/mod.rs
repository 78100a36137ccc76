use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "RTIMECLOCK_API_URL";

pub const DEV_API_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Absolute URL, or a path such as `/api/v1` joined to `server_origin`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub server_origin: Option<String>,
    /// Local SQLite file for the key/value cache and the audit log.
    #[serde(default = "default_store")]
    pub store: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// `--api` from the command line; wins over the environment.
    #[serde(skip)]
    pub api_override: Option<String>,
}

fn default_api_base_url() -> String {
    DEV_API_URL.to_string()
}
fn default_store() -> String {
    Config::store_file().to_string_lossy().to_string()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_request_timeout() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            server_origin: None,
            store: default_store(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            api_override: None,
        }
    }
}

impl Config {
    /// Platform configuration directory (`~/.rtimeclock`).
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rtimeclock")
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.conf")
    }

    pub fn store_file() -> PathBuf {
        Self::config_dir().join("rtimeclock.sqlite")
    }

    /// Load the configuration file, or defaults when it is missing or
    /// unreadable.
    pub fn load() -> Self {
        let path = Self::config_file();
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring configuration file");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Resolve the base URL: `--api`, then the environment, then the file.
    /// A relative path needs `server_origin`.
    pub fn api_url(&self) -> AppResult<String> {
        let raw = self
            .api_override
            .clone()
            .or_else(|| env::var(API_URL_ENV).ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.api_base_url.clone());
        resolve_api_url(&raw, self.server_origin.as_deref())
    }

    /// Create the config directory and file (the file is skipped in test
    /// mode). Returns the configuration that was written.
    pub fn init_all(custom_store: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let store = match custom_store {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() { p.to_path_buf() } else { dir.join(p) }
            }
            None => Self::store_file(),
        };

        let config = Config {
            store: store.to_string_lossy().to_string(),
            ..Config::default()
        };

        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
        }

        Ok(config)
    }
}

pub fn resolve_api_url(raw: &str, origin: Option<&str>) -> AppResult<String> {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(raw.trim_end_matches('/').to_string());
    }
    if raw.starts_with('/') {
        let origin = origin.filter(|o| !o.trim().is_empty()).ok_or_else(|| {
            AppError::Config(format!("'{raw}' is a relative API path; set server_origin"))
        })?;
        return Ok(format!(
            "{}{}",
            origin.trim_end_matches('/'),
            raw.trim_end_matches('/')
        ));
    }
    Err(AppError::Config(format!("Invalid API base URL '{raw}'")))
}
