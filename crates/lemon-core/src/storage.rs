//! Storage keys and the in-memory [`SecureStore`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::traits::SecureStore;

/// Key holding the access token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key holding the JSON-serialized user profile.
pub const USER_DATA_KEY: &str = "user_data";

/// All keys that make up a persisted session.
pub const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY];

/// A process-local [`SecureStore`].
///
/// Nothing survives the process. Useful for tests and for short-lived
/// tools that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value directly, bypassing failure injection.
    pub fn seed(&self, key: &str, value: &str) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Returns true if `key` currently has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Make subsequent `set_item` calls fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: key.to_string(),
                message: "writes disabled".to_string(),
            });
        }
        self.seed(key, value);
        Ok(())
    }

    async fn delete_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
