//! Process-wide configuration store.
//!
//! # Responsibility
//! - Hold already-parsed key/value settings supplied by the external
//!   bootstrap and expose typed accessors to core components.
//!
//! # Invariants
//! - The store never reads files or command lines itself; parsing belongs to
//!   the external loader.
//! - Reads are cheap and lock-scoped; no caller holds the lock across a
//!   resolution.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Gates master-hook delegation: when `true`, a non-master biz whose own
/// isolation space yields no resolution hook retries against the master
/// biz's space.
pub const DELEGATE_MASTER_HOOK_KEY: &str = "module.hook.delegate-to-master";

/// Parsed key/value configuration shared across core components.
#[derive(Debug, Default)]
pub struct ProcessConfig {
    values: RwLock<HashMap<String, String>>,
}

impl ProcessConfig {
    /// Creates an empty configuration store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated from parsed pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Sets one value, replacing any previous entry for the key.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values_mut().insert(key.into(), value.into());
    }

    /// Returns the raw string value for a key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// Returns a boolean value, falling back to `default` when the key is
    /// absent or not a recognized boolean literal.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            None => default,
        }
    }

    fn values(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.values.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn values_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.values.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
