//! Snapshot persistence for the ledger
//!
//! The ledger hands a complete snapshot (chain + pending pool) to a
//! [`Persistence`] backend after every mutation. Backends hold no live
//! references into the ledger; each save replaces the previous snapshot
//! atomically.

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Persisted ledger state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub pending_transactions: Vec<Transaction>,
    pub last_updated: DateTime<Utc>,
}

impl LedgerSnapshot {
    pub fn new(blocks: Vec<Block>, pending_transactions: Vec<Transaction>) -> Self {
        Self {
            blocks,
            pending_transactions,
            last_updated: Utc::now(),
        }
    }
}

/// Abstraction for persistence backends. Implementations must save and
/// load whole snapshots atomically.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing usable has been stored yet.
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>>;
    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()>;
}

/// Pretty-printed JSON file, replaced via write-to-temp + rename.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persistence for JsonFileStore {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path).map_err(|e| {
            LedgerError::PersistenceFailure(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if data.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: LedgerSnapshot = serde_json::from_str(&data).map_err(|e| {
            LedgerError::PersistenceFailure(format!(
                "Malformed ledger file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if snapshot.blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::PersistenceFailure(format!(
                "Failed to create data dir {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            LedgerError::PersistenceFailure(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;
        Ok(())
    }
}

/// SQLite-backed store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to open database: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                idx INTEGER PRIMARY KEY,
                hash TEXT NOT NULL,
                previous_hash TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                difficulty INTEGER NOT NULL,
                nonce INTEGER NOT NULL,
                transactions TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to create blocks table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_transactions (
                position INTEGER PRIMARY KEY,
                transaction_id TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::PersistenceFailure(format!(
                "Failed to create pending_transactions table: {}",
                e
            ))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to create metadata table: {}", e))
        })?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn load_blocks(conn: &Connection) -> Result<Vec<Block>> {
        let mut stmt = conn.prepare(
            "SELECT idx, hash, previous_hash, timestamp, difficulty, nonce, transactions
             FROM blocks ORDER BY idx ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let index: i64 = row.get(0)?;
            let timestamp: i64 = row.get(3)?;
            let difficulty: i64 = row.get(4)?;
            let nonce: i64 = row.get(5)?;
            let transactions_json: String = row.get(6)?;
            Ok((
                Block {
                    index: index as u64,
                    timestamp: timestamp as u64,
                    transactions: Vec::new(),
                    previous_hash: row.get(2)?,
                    nonce: nonce as u64,
                    hash: row.get(1)?,
                    difficulty: difficulty as u32,
                },
                transactions_json,
            ))
        })?;

        let mut blocks = Vec::new();
        for row in rows {
            let (mut block, transactions_json) = row?;
            block.transactions = serde_json::from_str(&transactions_json).map_err(|e| {
                LedgerError::PersistenceFailure(format!(
                    "Malformed transactions in block {}: {}",
                    block.index, e
                ))
            })?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn load_pending(conn: &Connection) -> Result<Vec<Transaction>> {
        let mut stmt = conn.prepare("SELECT data FROM pending_transactions ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut pending = Vec::new();
        for row in rows {
            let data = row?;
            let tx: Transaction = serde_json::from_str(&data).map_err(|e| {
                LedgerError::PersistenceFailure(format!("Malformed pending transaction: {}", e))
            })?;
            pending.push(tx);
        }
        Ok(pending)
    }

    fn load_last_updated(conn: &Connection) -> DateTime<Utc> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'last_updated'",
                [],
                |row| row.get(0),
            )
            .ok();
        value
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }
}

impl Persistence for Database {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        let conn = self.conn.lock();
        let blocks = Self::load_blocks(&conn)?;
        if blocks.is_empty() {
            return Ok(None);
        }
        let pending_transactions = Self::load_pending(&conn)?;
        let last_updated = Self::load_last_updated(&conn);
        Ok(Some(LedgerSnapshot {
            blocks,
            pending_transactions,
            last_updated,
        }))
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction().map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM blocks", [])?;
        for block in &snapshot.blocks {
            let transactions_json = serde_json::to_string(&block.transactions)?;
            tx.execute(
                "INSERT INTO blocks (idx, hash, previous_hash, timestamp, difficulty, nonce, transactions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    block.index as i64,
                    block.hash,
                    block.previous_hash,
                    block.timestamp as i64,
                    block.difficulty as i64,
                    block.nonce as i64,
                    transactions_json,
                ],
            )?;
        }

        tx.execute("DELETE FROM pending_transactions", [])?;
        for (position, pending) in snapshot.pending_transactions.iter().enumerate() {
            tx.execute(
                "INSERT INTO pending_transactions (position, transaction_id, data) VALUES (?1, ?2, ?3)",
                params![
                    position as i64,
                    pending.transaction_id,
                    serde_json::to_string(pending)?
                ],
            )?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('last_updated', ?1)",
            params![snapshot.last_updated.to_rfc3339()],
        )?;

        // Commit all changes atomically
        tx.commit().map_err(|e| {
            LedgerError::PersistenceFailure(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }
}

/// Simple in-memory persistence useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    snapshot: Arc<Mutex<Option<LedgerSnapshot>>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        let store = Self::new();
        *store.snapshot.lock() = Some(snapshot);
        store
    }

    /// Makes every subsequent save fail until reset.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<LedgerSnapshot> {
        self.snapshot.lock().clone()
    }
}

impl Persistence for InMemoryPersistence {
    fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(LedgerError::PersistenceFailure(
                "in-memory store configured to fail".to_string(),
            ));
        }
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
