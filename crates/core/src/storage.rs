//! Persistent credential storage
//!
//! The login flow owns these keys: it writes the credential with
//! [`CredentialStore::set`] (the CLI's `sign-in`) and reads it back with
//! [`CredentialStore::get`]. The auth store only removes it when the server
//! rejects a refresh, or on sign out.

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key/value storage for credentials that outlive the process or page
pub trait CredentialStore: Send + Sync {
    /// Read a stored value
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove a value. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// In-memory store, for tests and for embedders that persist nothing
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one entry
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

fn validate_key(key: &str) -> CoreResult<()> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
    {
        return Err(CoreError::storage(format!("invalid credential key: {key:?}")));
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileCredentialStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{CredentialStore, validate_key};
    use crate::error::{CoreError, CoreResult};
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    /// Stores each credential in its own file under a directory
    #[derive(Debug, Clone)]
    pub struct FileCredentialStore {
        directory: PathBuf,
    }

    impl FileCredentialStore {
        pub fn new(directory: impl Into<PathBuf>) -> Self {
            Self {
                directory: directory.into(),
            }
        }

        /// Store under the platform data directory (e.g. `~/.local/share/tokenward`)
        pub fn in_data_dir() -> CoreResult<Self> {
            let base = dirs::data_dir()
                .ok_or_else(|| CoreError::storage("no data directory on this platform"))?;
            Ok(Self::new(base.join("tokenward")))
        }

        pub fn directory(&self) -> &Path {
            &self.directory
        }

        fn path_for(&self, key: &str) -> CoreResult<PathBuf> {
            validate_key(key)?;
            Ok(self.directory.join(key))
        }
    }

    impl CredentialStore for FileCredentialStore {
        fn get(&self, key: &str) -> CoreResult<Option<String>> {
            match std::fs::read_to_string(self.path_for(key)?) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn set(&self, key: &str, value: &str) -> CoreResult<()> {
            let path = self.path_for(key)?;
            std::fs::create_dir_all(&self.directory)?;
            std::fs::write(path, value)?;
            Ok(())
        }

        fn remove(&self, key: &str) -> CoreResult<()> {
            match std::fs::remove_file(self.path_for(key)?) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::LocalStorageCredentialStore;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{CredentialStore, validate_key};
    use crate::error::{CoreError, CoreResult};
    use gloo::storage::{LocalStorage, Storage, errors::StorageError};

    /// Browser `localStorage`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStorageCredentialStore;

    impl CredentialStore for LocalStorageCredentialStore {
        fn get(&self, key: &str) -> CoreResult<Option<String>> {
            validate_key(key)?;
            match LocalStorage::get::<String>(key) {
                Ok(value) => Ok(Some(value)),
                Err(StorageError::KeyNotFound(_)) => Ok(None),
                Err(e) => Err(CoreError::storage(e.to_string())),
            }
        }

        fn set(&self, key: &str, value: &str) -> CoreResult<()> {
            validate_key(key)?;
            LocalStorage::set(key, value).map_err(|e| CoreError::storage(e.to_string()))
        }

        fn remove(&self, key: &str) -> CoreResult<()> {
            validate_key(key)?;
            LocalStorage::delete(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::with_entry("token", "abc");
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.set("token", "def").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("def"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);

        // Removing again is not an error
        store.remove("token").unwrap();
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("creds"));

        assert_eq!(store.get("token").unwrap(), None);
        store.set("token", "abc").unwrap();
        assert!(dir.path().join("creds").join("token").exists());
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        store.remove("token").unwrap();
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        for key in ["", ".", "..", "../token", "a/b", "a\\b"] {
            assert!(
                matches!(store.set(key, "x"), Err(CoreError::Storage { .. })),
                "key {key:?} should be rejected"
            );
        }
    }
}
