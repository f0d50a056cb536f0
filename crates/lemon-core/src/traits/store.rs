//! Durable secure storage trait.

use async_trait::async_trait;

use crate::error::StorageError;

/// A durable key/value store for session secrets.
///
/// Implementations are expected to keep values private to the current user
/// (keychain, owner-only files). Absent keys are not an error.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete_item(&self, key: &str) -> Result<(), StorageError>;
}
