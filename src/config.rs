//! Configuration management for the certificate ledger

use crate::error::{LedgerError, Result};
use crate::miner::MAX_DIFFICULTY;
use crate::transaction::MAX_TRANSACTION_SIZE;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default config file, overridable with `CERTLEDGER_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "certledger.toml";
pub const CONFIG_ENV_VAR: &str = "CERTLEDGER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub sealing: SealingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex digits required of every sealed block.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default)]
    pub genesis_difficulty: u32,
    /// Lowest work accepted on a stored block. Unset means `difficulty`;
    /// lower it before raising `difficulty` on an existing ledger.
    #[serde(default)]
    pub min_difficulty: Option<u32>,
    #[serde(default = "default_max_transaction_bytes")]
    pub max_transaction_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            genesis_difficulty: 0,
            min_difficulty: None,
            max_transaction_bytes: default_max_transaction_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Debounce window after the first submission, e.g. `"1s"` or `"500ms"`.
    #[serde(default = "default_delay", with = "humantime_serde_compat")]
    pub delay: Duration,
    /// Pool size that triggers an immediate seal.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    #[serde(default = "default_reward_recipient")]
    pub reward_recipient: Option<String>,
    #[serde(default = "default_reward_amount")]
    pub reward_amount: u64,
}

impl Default for SealingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            delay: default_delay(),
            max_pending: default_max_pending(),
            reward_recipient: default_reward_recipient(),
            reward_amount: default_reward_amount(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

mod humantime_serde_compat {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.difficulty > MAX_DIFFICULTY || self.ledger.genesis_difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "ledger difficulty must be at most {}",
                MAX_DIFFICULTY
            )));
        }

        if let Some(min) = self.ledger.min_difficulty {
            if min > self.ledger.difficulty {
                return Err(LedgerError::Config(format!(
                    "ledger.min_difficulty ({}) cannot exceed ledger.difficulty ({})",
                    min, self.ledger.difficulty
                )));
            }
        }

        if self.storage.backend != StorageBackend::Memory && self.storage.path.trim().is_empty() {
            return Err(LedgerError::Config(
                "storage.path must be set for file-backed storage".to_string(),
            ));
        }

        if self.sealing.max_pending == 0 {
            return Err(LedgerError::Config(
                "sealing.max_pending must be at least 1".to_string(),
            ));
        }

        if self.ledger.max_transaction_bytes == 0 {
            return Err(LedgerError::Config(
                "ledger.max_transaction_bytes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loads configuration from `path`; a missing or empty file yields defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path.as_ref()).unwrap_or_default();
    if config_str.trim().is_empty() {
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }
    Config::from_toml(&config_str)
}

/// Loads configuration from `$CERTLEDGER_CONFIG` or `certledger.toml`.
pub fn load_config() -> Result<Config> {
    let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(path)
}

fn default_storage_path() -> String {
    "./data/ledger.json".to_string()
}

fn default_difficulty() -> u32 {
    2
}

fn default_max_transaction_bytes() -> usize {
    MAX_TRANSACTION_SIZE
}

fn default_enabled() -> bool {
    true
}

fn default_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_pending() -> usize {
    50
}

fn default_reward_recipient() -> Option<String> {
    Some("system".to_string())
}

fn default_reward_amount() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.ledger.difficulty, 2);
        assert_eq!(config.ledger.genesis_difficulty, 0);
        assert_eq!(config.sealing.delay, Duration::from_secs(1));
        assert_eq!(config.sealing.max_pending, 50);
        assert_eq!(config.sealing.reward_recipient.as_deref(), Some("system"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            [storage]
            backend = "sqlite"
            path = "/var/lib/certledger/ledger.db"

            [ledger]
            difficulty = 3

            [sealing]
            delay = "250ms"
            max_pending = 10
            reward_amount = 5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.ledger.difficulty, 3);
        assert_eq!(config.sealing.delay, Duration::from_millis(250));
        assert_eq!(config.sealing.max_pending, 10);
        assert_eq!(config.sealing.reward_amount, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_rejects_impossible_difficulty() {
        let err = Config::from_toml("[ledger]\ndifficulty = 65\n").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_min_difficulty_bounded_by_difficulty() {
        let config = Config::from_toml("[ledger]\ndifficulty = 3\nmin_difficulty = 2\n").unwrap();
        assert_eq!(config.ledger.min_difficulty, Some(2));
        assert!(Config::from_toml("[ledger]\ndifficulty = 2\nmin_difficulty = 3\n").is_err());
    }

    #[test]
    fn test_rejects_zero_threshold() {
        assert!(Config::from_toml("[sealing]\nmax_pending = 0\n").is_err());
    }

    #[test]
    fn test_rejects_bad_duration() {
        assert!(Config::from_toml("[sealing]\ndelay = \"soon\"\n").is_err());
    }
}
