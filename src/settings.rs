//! Game settings
//!
//! Loaded once at startup: LocalStorage on web, a JSON file on native.
//! Anything missing falls back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::{ENERGY_REFILL_MS, LEADERBOARD_SIZE, MAX_DAILY_PLAYS};
use crate::error::ConfigError;
use crate::ledger::DEFAULT_TIMEOUT_MS;
use crate::persistence::Identity;
use crate::tuning::Tuning;

/// Where the remote ledger lives. Absent means the ledger is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// RPC endpoint URL
    pub endpoint: String,
    /// Deployed contract address
    pub contract_address: String,
    /// Give up on a request after this long
    pub timeout_ms: u64,
    /// Entries requested for the leaderboard screen
    pub leaderboard_size: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            contract_address: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

impl LedgerSettings {
    /// A ledger needs at least a contract to talk to
    pub fn is_usable(&self) -> bool {
        !self.contract_address.trim().is_empty()
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connected identity; `None` plays as an anonymous local player
    pub identity: Option<Identity>,
    /// Physics and obstacle balance
    pub tuning: Tuning,
    pub ledger: Option<LedgerSettings>,

    // === Energy ===
    pub max_energy: u32,
    pub energy_refill_ms: u64,

    /// Fixed RNG seed for reproducible runs (e.g. demos); random when absent
    pub seed: Option<u64>,
    /// Native only: where profile records are written
    pub profile_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity: None,
            tuning: Tuning::default(),
            ledger: None,
            max_energy: MAX_DAILY_PLAYS,
            energy_refill_ms: ENERGY_REFILL_MS,
            seed: None,
            profile_dir: None,
        }
    }
}

impl Settings {
    /// LocalStorage key / default file name
    const STORAGE_KEY: &'static str = "baserunner_settings";

    /// Parse and validate a settings document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.tuning.validate().map_err(ConfigError::Tuning)?;
        Ok(settings)
    }

    /// Ledger settings, only if they point somewhere
    pub fn active_ledger(&self) -> Option<&LedgerSettings> {
        self.ledger.as_ref().filter(|l| l.is_usable())
    }

    pub fn leaderboard_size(&self) -> usize {
        self.ledger
            .as_ref()
            .map(|l| l.leaderboard_size)
            .unwrap_or(LEADERBOARD_SIZE)
    }

    /// Identity to play under, generating an anonymous one when none is set
    pub fn identity_or_anonymous(&self) -> Identity {
        self.identity
            .clone()
            .unwrap_or_else(|| Identity::Anonymous("local".to_string()))
    }

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings from `$BASE_RUNNER_SETTINGS` or `./baserunner_settings.json` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let path = std::env::var("BASE_RUNNER_SETTINGS")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from(format!("{}.json", Self::STORAGE_KEY)));

        if !path.exists() {
            log::info!("Using default settings");
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.active_ledger().is_none());
    }

    #[test]
    fn test_partial_tuning_and_ledger() {
        let settings = Settings::from_json(
            r#"{
                "identity": {"kind": "wallet", "key": "0xabc"},
                "tuning": {"gravity": 0.8},
                "ledger": {"contract_address": "0xdead", "timeout_ms": 5000}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.tuning.gravity, 0.8);
        assert_eq!(settings.tuning.jump_force, Tuning::default().jump_force);
        let ledger = settings.active_ledger().unwrap();
        assert_eq!(ledger.timeout_ms, 5000);
        assert_eq!(ledger.leaderboard_size, LEADERBOARD_SIZE);
        assert_eq!(
            settings.identity_or_anonymous(),
            Identity::Wallet("0xabc".into())
        );
    }

    #[test]
    fn test_blank_contract_disables_ledger() {
        let settings = Settings::from_json(r#"{"ledger": {"endpoint": "http://x"}}"#).unwrap();
        assert!(settings.ledger.is_some());
        assert!(settings.active_ledger().is_none());
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let err = Settings::from_json(r#"{"tuning": {"gravity": -1.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Tuning(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Settings::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
