//! Local key/value persistence.
//!
//! Everything stored here is a best-effort cache (last selected employee,
//! auth record, performer name, admin token); the backend stays the source
//! of truth. `SqliteStore` is the default, `MemoryStore` backs the tests.

pub mod log;
pub mod memory;
pub mod migrate;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::errors::AppResult;

/// Well-known keys.
pub mod keys {
    pub const SELECTED_EMPLOYEE: &str = "selected-employee-id";
    pub const AUTH: &str = "auth";
    pub const PERFORMER_NAME: &str = "performer-name";
    pub const ADMIN_TOKEN: &str = "admin-token";
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;

    /// Write `value`, or drop the key when it is empty.
    fn set_or_remove(&self, key: &str, value: &str) -> AppResult<()> {
        if value.is_empty() {
            self.remove(key)
        } else {
            self.set(key, value)
        }
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        (**self).remove(key)
    }
}
