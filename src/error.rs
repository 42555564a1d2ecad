//! Error types for the certificate ledger

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// A submission is missing required fields or is otherwise unacceptable.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    /// An append would break the hash chain. Requires operator attention.
    #[error("Chain inconsistency: {0}")]
    ChainInconsistency(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Sealing aborted: {0}")]
    SealingAborted(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for LedgerError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::PersistenceFailure(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
