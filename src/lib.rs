//! certledger - A tamper-evident ledger for anchoring certificate hashes
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the hash chain, integrity validation and search
//! - [`transaction`] - Transaction types and submission validation
//! - [`mempool`] - Pending transaction pool
//!
//! ## Sealing
//! - [`miner`] - Proof-of-work sealing
//! - [`scheduler`] - Debounced background sealing
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 helpers, certificate hashing and transaction ids
//!
//! ## Service & State
//! - [`ledger`] - The ledger service that owns chain and pool
//! - [`persistence`] - Snapshot storage (JSON file, SQLite, in-memory)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - Helpers shared by the binaries

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Sealing
// ============================================================================
pub mod miner;
pub mod scheduler;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Service & State
// ============================================================================
pub mod ledger;
pub mod persistence;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

pub use error::{LedgerError, Result};
pub use ledger::{LedgerService, LedgerSettings, LedgerStats, StoreReceipt, VerificationResult};
