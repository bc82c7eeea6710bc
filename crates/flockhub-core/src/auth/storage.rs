//! Key/value storage media backing the token store and the user marker.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock};

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tempfile::NamedTempFile;

/// Keyring service name
const SERVICE_NAME: &str = "flockhub";

/// Storage file name in cache directory
const STORAGE_FILE: &str = "session.json";

/// A synchronous string key/value medium.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Lost on exit.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| anyhow!("memory storage poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("memory storage poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("memory storage poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

/// JSON object persisted to `session.json` under a directory.
///
/// Updates are serialized by an internal lock and land by renaming a fully
/// written temp file over the old one, so readers never see a partial file.
pub struct FileStorage {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| anyhow!("file storage poisoned"))
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        let mut file =
            NamedTempFile::new_in(&self.dir).context("Failed to create temporary session file")?;
        serde_json::to_writer_pretty(&mut file, values)?;
        file.persist(self.path()).context("Failed to write session file")?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// OS keychain storage, one keyring entry per key.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve value from keychain"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store value in keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete value from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStorage::new(dir.path().join("nested"));
        first.set("auth_token", "abc").unwrap();
        first.set("user", "{}").unwrap();

        let second = FileStorage::new(dir.path().join("nested"));
        assert_eq!(second.get("auth_token").unwrap().as_deref(), Some("abc"));

        second.remove("auth_token").unwrap();
        assert_eq!(first.get("auth_token").unwrap(), None);
        assert_eq!(first.get("user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_concurrent_writers_keep_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());

        std::thread::scope(|scope| {
            for writer in 0..2 {
                let storage = &storage;
                scope.spawn(move || {
                    for i in 0..100 {
                        storage.set(&format!("w{writer}-{i}"), "v").unwrap();
                    }
                });
            }
            let storage = &storage;
            scope.spawn(move || {
                for _ in 0..100 {
                    // Never a parse error from a half-written file.
                    storage.get("w0-0").unwrap();
                }
            });
        });

        let on_disk = FileStorage::new(dir.path().to_path_buf());
        assert_eq!(on_disk.read_all().unwrap().len(), 200);
        assert_eq!(on_disk.get("w1-99").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert_eq!(storage.get("anything").unwrap(), None);
        storage.remove("anything").unwrap();
        assert!(!dir.path().join(STORAGE_FILE).exists());
    }

    #[test]
    fn test_file_storage_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_FILE), "not json").unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.get("auth_token").is_err());
    }
}
