//! Local authentication record and PIN format rules.

use crate::errors::{AppError, AppResult};
use crate::store::{KeyValueStore, keys};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// A record this old is still valid; one millisecond older is not.
pub const AUTH_TIMEOUT_MS: i64 = 8 * 60 * 60 * 1000;

pub const PIN_LENGTH: usize = 4;

static ADMIN_PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4,10}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub employee_id: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl AuthRecord {
    pub fn new(employee_id: i64, now_ms: i64) -> Self {
        Self {
            employee_id,
            timestamp: now_ms,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp > AUTH_TIMEOUT_MS
    }

    /// Milliseconds left before expiry (0 once expired).
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.timestamp + AUTH_TIMEOUT_MS - now_ms).max(0)
    }
}

/// Read the stored record. Expired or unreadable records are removed and
/// reported as absent.
pub fn load_auth<S: KeyValueStore + ?Sized>(store: &S, now_ms: i64) -> AppResult<Option<AuthRecord>> {
    let Some(raw) = store.get(keys::AUTH)? else {
        return Ok(None);
    };

    match serde_json::from_str::<AuthRecord>(&raw) {
        Ok(rec) if rec.is_expired(now_ms) => {
            debug!(employee_id = rec.employee_id, "auth record expired");
            store.remove(keys::AUTH)?;
            Ok(None)
        }
        Ok(rec) => Ok(Some(rec)),
        Err(e) => {
            warn!(error = %e, "discarding unreadable auth record");
            store.remove(keys::AUTH)?;
            Ok(None)
        }
    }
}

/// True when a valid record exists for `employee_id`.
pub fn is_authenticated_for<S: KeyValueStore + ?Sized>(
    store: &S,
    employee_id: i64,
    now_ms: i64,
) -> AppResult<bool> {
    Ok(load_auth(store, now_ms)?.is_some_and(|r| r.employee_id == employee_id))
}

pub fn save_auth<S: KeyValueStore + ?Sized>(store: &S, record: &AuthRecord) -> AppResult<()> {
    store.set(keys::AUTH, &serde_json::to_string(record)?)
}

pub fn clear_auth<S: KeyValueStore + ?Sized>(store: &S) -> AppResult<()> {
    store.remove(keys::AUTH)
}

/// Keypad buffer for the four-digit employee PIN.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PinPad {
    digits: String,
}

impl PinPad {
    /// Non-digits and digits past the fourth are ignored.
    pub fn press(&mut self, key: char) {
        if key.is_ascii_digit() && self.digits.len() < PIN_LENGTH {
            self.digits.push(key);
        }
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == PIN_LENGTH
    }

    pub fn value(&self) -> &str {
        &self.digits
    }

    /// Dots shown instead of the digits.
    pub fn masked(&self) -> String {
        "•".repeat(self.digits.len())
    }
}

/// Employee keypad PINs are exactly four digits.
pub fn validate_pin_format(pin: &str) -> AppResult<()> {
    if pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::Validation("PIN must be 4 digits".into()))
    }
}

/// PINs set by an administrator may be 4 to 10 digits.
pub fn validate_admin_pin(pin: &str) -> AppResult<()> {
    if ADMIN_PIN_RE.is_match(pin) {
        Ok(())
    } else {
        Err(AppError::Validation("PIN must be 4-10 digits".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn record_uses_camel_case_keys() {
        let json = serde_json::to_string(&AuthRecord::new(5, T0)).unwrap();
        assert_eq!(json, r#"{"employeeId":5,"timestamp":1700000000000}"#);
    }

    #[test]
    fn exactly_eight_hours_is_still_valid() {
        let store = MemoryStore::new();
        save_auth(&store, &AuthRecord::new(5, T0)).unwrap();

        assert!(load_auth(&store, T0 + AUTH_TIMEOUT_MS).unwrap().is_some());
        assert!(load_auth(&store, T0 + AUTH_TIMEOUT_MS + 1).unwrap().is_none());
        assert!(!store.contains(keys::AUTH));
    }

    #[test]
    fn garbage_record_is_dropped() {
        let store = MemoryStore::with_entries([(keys::AUTH, "not json")]);
        assert_eq!(load_auth(&store, T0).unwrap(), None);
        assert!(!store.contains(keys::AUTH));
    }

    #[test]
    fn record_for_other_employee_does_not_authenticate() {
        let store = MemoryStore::new();
        save_auth(&store, &AuthRecord::new(5, T0)).unwrap();
        assert!(is_authenticated_for(&store, 5, T0).unwrap());
        assert!(!is_authenticated_for(&store, 6, T0).unwrap());
    }

    #[test]
    fn pin_pad_caps_at_four_digits() {
        let mut pad = PinPad::default();
        for k in "12x345".chars() {
            pad.press(k);
        }
        assert_eq!(pad.value(), "1234");
        assert!(pad.is_complete());
        pad.backspace();
        assert_eq!(pad.masked(), "•••");
        pad.clear();
        assert_eq!(pad.value(), "");
    }

    #[test]
    fn pin_formats() {
        assert!(validate_pin_format("1234").is_ok());
        assert!(validate_pin_format("123").is_err());
        assert!(validate_pin_format("12a4").is_err());
        assert!(validate_pin_format("12345").is_err());

        assert!(validate_admin_pin("1234567890").is_ok());
        assert!(validate_admin_pin("12345678901").is_err());
        assert!(validate_admin_pin("123").is_err());
    }
}
