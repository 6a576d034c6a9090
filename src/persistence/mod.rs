//! Local player profile persistence
//!
//! Features:
//! - One JSON record per identity under `baserunner_<identity>`
//! - LocalStorage on web, a JSON file per identity on native, memory for tests
//! - Read-modify-write updates (last writer wins across tabs)

mod store;

pub use store::{FileStore, MemoryStore};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_DAILY_PLAYS;
use crate::error::StorageError;

/// Who is playing: a connected wallet, or a locally generated key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum Identity {
    Wallet(String),
    Anonymous(String),
}

impl Identity {
    /// Key the profile is stored under
    pub fn key(&self) -> &str {
        match self {
            Identity::Wallet(address) => address,
            Identity::Anonymous(key) => key,
        }
    }

    /// Wallet address, if this identity can talk to the ledger
    pub fn wallet(&self) -> Option<&str> {
        match self {
            Identity::Wallet(address) => Some(address),
            Identity::Anonymous(_) => None,
        }
    }

    pub fn storage_key(&self) -> String {
        format!("baserunner_{}", self.key())
    }
}

/// Durable per-identity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(skip)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub best_score: u32,
    /// Energy as of `last_play_ms`; refill is applied when read
    #[serde(default = "default_energy")]
    pub energy: u32,
    /// Wall-clock ms of the last energy consumption (0 = never)
    #[serde(default, rename = "lastPlay")]
    pub last_play_ms: u64,
    #[serde(default)]
    pub total_games: u32,
}

fn default_energy() -> u32 {
    MAX_DAILY_PLAYS
}

impl PlayerProfile {
    /// Profile for someone who has never played on this device
    pub fn fresh(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            best_score: 0,
            energy: MAX_DAILY_PLAYS,
            last_play_ms: 0,
            total_games: 0,
        }
    }
}

/// Backend for profile records
pub trait ProfileStore {
    /// Read the stored profile, `None` if nothing was ever saved
    fn load(&self, identity: &Identity) -> Result<Option<PlayerProfile>, StorageError>;

    /// Overwrite the stored profile
    fn save(&mut self, profile: &PlayerProfile) -> Result<(), StorageError>;
}

/// Load a profile, falling back to a fresh one when none exists.
pub fn load_or_fresh<S: ProfileStore + ?Sized>(
    store: &S,
    identity: &Identity,
) -> Result<PlayerProfile, StorageError> {
    Ok(match store.load(identity)? {
        Some(mut profile) => {
            profile.identity = Some(identity.clone());
            profile
        }
        None => PlayerProfile::fresh(identity.clone()),
    })
}

/// Re-read the stored record, apply `f`, write it back.
///
/// Another tab may have written since we last loaded; applying the change to
/// the freshest copy keeps its unrelated fields instead of clobbering them.
pub fn read_modify_write<S, F>(
    store: &mut S,
    identity: &Identity,
    f: F,
) -> Result<PlayerProfile, StorageError>
where
    S: ProfileStore + ?Sized,
    F: FnOnce(&mut PlayerProfile),
{
    let mut profile = load_or_fresh(&*store, identity)?;
    f(&mut profile);
    store.save(&profile)?;
    Ok(profile)
}

pub(crate) fn encode(profile: &PlayerProfile) -> Result<String, StorageError> {
    serde_json::to_string(profile).map_err(|e| StorageError::Corrupt {
        key: profile
            .identity
            .as_ref()
            .map(Identity::storage_key)
            .unwrap_or_default(),
        reason: e.to_string(),
    })
}

pub(crate) fn decode(identity: &Identity, json: &str) -> Result<PlayerProfile, StorageError> {
    let mut profile: PlayerProfile =
        serde_json::from_str(json).map_err(|e| StorageError::Corrupt {
            key: identity.storage_key(),
            reason: e.to_string(),
        })?;
    profile.identity = Some(identity.clone());
    Ok(profile)
}
