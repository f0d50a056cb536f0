//! One-file-per-key secure storage.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use uuid::Uuid;

use lemon_core::SecureStore;
use lemon_core::error::StorageError;

/// A [`SecureStore`] keeping each key in its own file under one directory.
///
/// Writes go to a temporary file which is renamed over the target, so a
/// reader never sees a half-written value. On Unix the directory is created
/// `0700` and every file `0600`.
#[derive(Debug, Clone)]
pub struct FileSecureStore {
    dir: PathBuf,
}

impl FileSecureStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory values are kept in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    ///
    /// Keys are restricted to ASCII letters, digits, `_` and `-` so a key can
    /// never name a file outside the store.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        valid.then(|| self.dir.join(key))
    }

    async fn create_dir(&self) -> std::io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&self.dir).await
    }

    async fn write_atomic(&self, path: &Path, value: &str) -> std::io::Result<()> {
        self.create_dir().await?;

        let tmp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let result = async {
            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(&tmp).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);

            fs::rename(&tmp, path).await
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }
}

fn invalid_key(key: &str) -> String {
    format!("invalid key '{key}'")
}

#[async_trait]
impl SecureStore for FileSecureStore {
    #[instrument(skip(self))]
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key).ok_or_else(|| StorageError::Read {
            key: key.to_string(),
            message: invalid_key(key),
        })?;

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    #[instrument(skip(self, value))]
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key).ok_or_else(|| StorageError::Write {
            key: key.to_string(),
            message: invalid_key(key),
        })?;

        self.write_atomic(&path, value)
            .await
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(path = %path.display(), "Stored value");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key).ok_or_else(|| StorageError::Delete {
            key: key.to_string(),
            message: invalid_key(key),
        })?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemon_core::storage::{AUTH_TOKEN_KEY, USER_DATA_KEY};
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path().join("data"));

        assert_eq!(store.get_item(AUTH_TOKEN_KEY).await.unwrap(), None);
        // deleting what was never written is fine
        store.delete_item(AUTH_TOKEN_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn values_survive_a_new_store() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path());
        store.set_item(AUTH_TOKEN_KEY, "a.b.c").await.unwrap();
        store.set_item(AUTH_TOKEN_KEY, "d.e.f").await.unwrap();

        let reopened = FileSecureStore::new(dir.path());
        assert_eq!(
            reopened.get_item(AUTH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("d.e.f")
        );

        reopened.delete_item(AUTH_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get_item(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path());
        store.set_item(USER_DATA_KEY, r#"{"id":1}"#).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![USER_DATA_KEY.to_string()]);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path());

        for key in ["", "../escape", "a/b", "."] {
            assert!(matches!(
                store.set_item(key, "x").await,
                Err(StorageError::Write { .. })
            ));
            assert!(store.get_item(key).await.is_err());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileSecureStore::new(dir.path().join("secure"));
        store.set_item(AUTH_TOKEN_KEY, "a.b.c").await.unwrap();

        let file = std::fs::metadata(dir.path().join("secure").join(AUTH_TOKEN_KEY)).unwrap();
        assert_eq!(file.permissions().mode() & 0o777, 0o600);
        let folder = std::fs::metadata(dir.path().join("secure")).unwrap();
        assert_eq!(folder.permissions().mode() & 0o777, 0o700);
    }
}
