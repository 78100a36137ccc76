//! In-flight action guard: one guarded request at a time.

use crate::errors::{AppError, AppResult};
use std::fmt::Display;

#[derive(Debug)]
pub struct PendingGuard<K> {
    current: Option<K>,
}

impl<K> Default for PendingGuard<K> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<K: Copy + Display> PendingGuard<K> {
    /// Register `action` as in flight, or fail with `Busy` naming the one
    /// already pending.
    pub fn begin(&mut self, action: K) -> AppResult<()> {
        if let Some(pending) = self.current {
            return Err(AppError::Busy(pending.to_string()));
        }
        self.current = Some(action);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<K> {
        self.current
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_until_finish() {
        let mut g = PendingGuard::default();
        g.begin("start").unwrap();
        let err = g.begin("stop").unwrap_err();
        assert_eq!(err.to_string(), "Another start request is still pending");
        g.finish();
        assert!(g.begin("stop").is_ok());
        assert_eq!(g.current(), Some("stop"));
    }
}
