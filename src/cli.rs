//! Helpers shared by the `certledger` binaries

use crate::config::{load_config, load_config_from, Config, StorageBackend, StorageConfig};
use crate::error::Result;
use crate::ledger::{LedgerService, LedgerSettings};
use crate::persistence::{Database, InMemoryPersistence, JsonFileStore, Persistence};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests, embedding).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Builds the configured persistence backend. An SQLite file that cannot
/// be opened degrades to in-memory storage.
pub fn open_persistence(storage: &StorageConfig) -> Result<Arc<dyn Persistence>> {
    let persistence: Arc<dyn Persistence> = match storage.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&storage.path)),
        StorageBackend::Sqlite => match Database::open(&storage.path) {
            Ok(db) => Arc::new(db),
            Err(e) => {
                warn!(
                    "Failed to open DB at {}: {}. Falling back to in-memory persistence.",
                    storage.path, e
                );
                Arc::new(InMemoryPersistence::new())
            }
        },
        StorageBackend::Memory => Arc::new(InMemoryPersistence::new()),
    };
    Ok(persistence)
}

/// Reads the config from an explicit path, `$CERTLEDGER_CONFIG`, or
/// falls back to defaults.
pub fn resolve_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

/// Opens the ledger described by `config`.
pub async fn open_ledger(config: &Config) -> Result<Arc<LedgerService>> {
    if let StorageBackend::Sqlite = config.storage.backend {
        if let Some(parent) = Path::new(&config.storage.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let persistence = open_persistence(&config.storage)?;
    let ledger = LedgerService::initialize(persistence, LedgerSettings::from(config)).await?;
    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path,
        blocks = ledger.chain_len().await,
        "ledger opened"
    );
    Ok(Arc::new(ledger))
}

pub async fn load_ledger_from_config(
    config_path: Option<&Path>,
) -> Result<(Config, Arc<LedgerService>)> {
    let config = resolve_config(config_path)?;
    let ledger = open_ledger(&config).await?;
    Ok((config, ledger))
}
