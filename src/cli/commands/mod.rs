//! Command handlers. Each invocation builds its own API client, store and
//! state machine; nothing survives between runs except the local store.

pub mod admin;
pub mod clock;
pub mod config;
pub mod employees;
pub mod entries;
pub mod init;
pub mod insights;
pub mod log;
pub mod photo;
pub mod session;
pub mod status;
pub mod tags;

use crate::api::HttpApi;
use crate::config::Config;
use crate::core::{ClockMachine, SessionTracker};
use crate::errors::AppResult;
use crate::store::SqliteStore;
use crate::store::log::ttlog;
use crate::ui::messages::warning;
use crate::utils::SystemClock;
use std::time::Duration;

pub(crate) type CliClock = ClockMachine<HttpApi, SqliteStore, SystemClock>;
pub(crate) type CliSession = SessionTracker<HttpApi, SqliteStore, SystemClock>;

pub(crate) fn open_store(cfg: &Config) -> AppResult<SqliteStore> {
    SqliteStore::open(&cfg.store)
}

pub(crate) fn http_api(cfg: &Config) -> AppResult<HttpApi> {
    HttpApi::new(
        &cfg.api_url()?,
        Duration::from_secs(cfg.request_timeout_secs),
    )
}

/// Clock machine without any request made; nothing is selected yet.
pub(crate) fn offline_clock_machine(cfg: &Config) -> AppResult<CliClock> {
    Ok(ClockMachine::new(http_api(cfg)?, open_store(cfg)?, SystemClock))
}

/// Clock machine with the remembered employee restored. Without a
/// remembered employee no request is made.
pub(crate) fn clock_machine(cfg: &Config) -> AppResult<CliClock> {
    let mut machine = offline_clock_machine(cfg)?;
    machine.restore()?;
    Ok(machine)
}

pub(crate) fn session_tracker(cfg: &Config) -> AppResult<CliSession> {
    Ok(SessionTracker::new(http_api(cfg)?, open_store(cfg)?, SystemClock))
}

/// Audit line in the local log table; failures only warn.
pub(crate) fn audit(store: &SqliteStore, operation: &str, target: &str, message: &str) {
    if let Err(e) = ttlog(&store.conn, operation, target, message) {
        warning(format!("Failed to write internal log: {e}"));
    }
}
