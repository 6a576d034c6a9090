//! Profile store backends

use std::collections::HashMap;
use std::path::PathBuf;

use super::{Identity, PlayerProfile, ProfileStore, decode, encode};
use crate::error::StorageError;

/// In-memory store. Can be switched offline to exercise degraded paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read and write fail as if storage vanished
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Put a raw record in place (simulates another tab or an old build)
    pub fn insert_raw(&mut self, key: &str, json: &str) {
        self.records.insert(key.to_string(), json.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl ProfileStore for MemoryStore {
    fn load(&self, identity: &Identity) -> Result<Option<PlayerProfile>, StorageError> {
        if self.offline {
            return Err(StorageError::Unavailable("memory store offline".into()));
        }
        self.records
            .get(&identity.storage_key())
            .map(|json| decode(identity, json))
            .transpose()
    }

    fn save(&mut self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let Some(identity) = profile.identity.as_ref() else {
            return Err(StorageError::WriteFailed {
                key: String::new(),
                reason: "profile has no identity".into(),
            });
        };
        if self.offline {
            return Err(StorageError::WriteFailed {
                key: identity.storage_key(),
                reason: "memory store offline".into(),
            });
        }
        let json = encode(profile)?;
        self.records.insert(identity.storage_key(), json);
        Ok(())
    }
}

/// One `<key>.json` file per identity inside a directory (native builds)
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, identity: &Identity) -> PathBuf {
        self.dir.join(format!("{}.json", identity.storage_key()))
    }
}

impl ProfileStore for FileStore {
    fn load(&self, identity: &Identity) -> Result<Option<PlayerProfile>, StorageError> {
        let path = self.path(identity);
        match std::fs::read_to_string(&path) {
            Ok(json) => decode(identity, &json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Unavailable(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn save(&mut self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let Some(identity) = profile.identity.as_ref() else {
            return Err(StorageError::WriteFailed {
                key: String::new(),
                reason: "profile has no identity".into(),
            });
        };
        let json = encode(profile)?;
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            key: identity.storage_key(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;
        // Write to a temp file then rename so a crash never leaves half a record
        let path = self.path(identity);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_failed)?;
        std::fs::rename(&tmp, &path).map_err(write_failed)?;
        log::debug!("Profile saved to {}", path.display());
        Ok(())
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StorageError::Unavailable("LocalStorage not available".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl ProfileStore for LocalStorageStore {
    fn load(&self, identity: &Identity) -> Result<Option<PlayerProfile>, StorageError> {
        let storage = Self::storage()?;
        let key = identity.storage_key();
        match storage.get_item(&key) {
            Ok(Some(json)) => decode(identity, &json).map(Some),
            Ok(None) => Ok(None),
            Err(_) => Err(StorageError::Unavailable(format!("cannot read {key}"))),
        }
    }

    fn save(&mut self, profile: &PlayerProfile) -> Result<(), StorageError> {
        let Some(identity) = profile.identity.as_ref() else {
            return Err(StorageError::WriteFailed {
                key: String::new(),
                reason: "profile has no identity".into(),
            });
        };
        let storage = Self::storage()?;
        let key = identity.storage_key();
        let json = encode(profile)?;
        storage
            .set_item(&key, &json)
            .map_err(|_| StorageError::WriteFailed {
                key: key.clone(),
                reason: "set_item rejected (quota or private mode)".into(),
            })?;
        log::info!("Profile saved ({key})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_offline() {
        let mut store = MemoryStore::new();
        let id = Identity::Anonymous("p1".into());
        store.save(&PlayerProfile::fresh(id.clone())).unwrap();

        store.set_offline(true);
        assert!(store.load(&id).is_err());
        assert!(matches!(
            store.save(&PlayerProfile::fresh(id.clone())),
            Err(StorageError::WriteFailed { .. })
        ));

        store.set_offline(false);
        assert!(store.load(&id).unwrap().is_some());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("base-runner-test-{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        let id = Identity::Wallet("0xfile".into());

        assert_eq!(store.load(&id).unwrap(), None);

        let mut profile = PlayerProfile::fresh(id.clone());
        profile.best_score = 12;
        store.save(&profile).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(profile));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
