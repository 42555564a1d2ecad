//! Ledger service
//!
//! Owns the hash chain and the pending pool behind one reader-writer lock.
//! Mutations (submit, seal) take the write lock only for short, in-memory
//! steps; proof-of-work runs on the blocking pool with no lock held, so
//! submissions keep flowing while a block is being sealed.
//!
//! While a seal is in progress the drained transactions are parked in
//! `in_flight`. They stay visible to lookups and are written into every
//! snapshot until the block is appended, or put back in the pool if the
//! seal fails. Mining and appending run on their own task holding the
//! seal lock, so a caller that stops waiting cannot strand them.

use crate::blockchain::{Block, BlockSummary, ChainValidation, HashChain, TransactionRecord};
use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::mempool::Mempool;
use crate::miner::mine_block;
use crate::persistence::{LedgerSnapshot, Persistence};
use crate::transaction::{CertificateSubmission, Transaction, TransactionStatus, MAX_TRANSACTION_SIZE};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Message returned when a hash is not anchored in any sealed block.
pub const NOT_FOUND_MESSAGE: &str = "Certificate not found on blockchain";

/// Tunables the ledger needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub difficulty: u32,
    pub genesis_difficulty: u32,
    /// Work every non-genesis block must carry when a chain is validated,
    /// whatever difficulty the block records. Defaults to `difficulty`.
    pub min_difficulty: Option<u32>,
    pub max_transaction_bytes: usize,
    pub reward_amount: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            difficulty: 2,
            genesis_difficulty: 0,
            min_difficulty: None,
            max_transaction_bytes: MAX_TRANSACTION_SIZE,
            reward_amount: 100,
        }
    }
}

impl From<&Config> for LedgerSettings {
    fn from(config: &Config) -> Self {
        Self {
            difficulty: config.ledger.difficulty,
            genesis_difficulty: config.ledger.genesis_difficulty,
            min_difficulty: config.ledger.min_difficulty,
            max_transaction_bytes: config.ledger.max_transaction_bytes,
            reward_amount: config.sealing.reward_amount,
        }
    }
}

impl LedgerSettings {
    pub fn required_work(&self) -> u32 {
        self.min_difficulty.unwrap_or(self.difficulty)
    }
}

/// Answer to "is this certificate hash anchored?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    fn found(record: TransactionRecord) -> Self {
        let tx = record.transaction;
        VerificationResult {
            verified: true,
            block_number: tx.block_number,
            block_hash: tx.block_hash,
            transaction_id: Some(tx.transaction_id),
            timestamp: Some(tx.timestamp),
            confirmations: Some(record.confirmations),
            message: None,
        }
    }

    fn not_found() -> Self {
        VerificationResult {
            verified: false,
            block_number: None,
            block_hash: None,
            transaction_id: None,
            timestamp: None,
            confirmations: None,
            message: Some(NOT_FOUND_MESSAGE.to_string()),
        }
    }
}

/// Acknowledgement for an accepted certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReceipt {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub anchor_transactions: usize,
    pub pending_transactions: usize,
    pub difficulty: u32,
    pub unique_issuers: usize,
    /// Anchors per issuer, sorted by issuer name.
    pub issuer_breakdown: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transaction_time: Option<u64>,
    pub latest_block: BlockSummary,
}

struct LedgerState {
    chain: HashChain,
    pool: Mempool,
    in_flight: Vec<Transaction>,
}

impl LedgerState {
    fn pending_len(&self) -> usize {
        self.in_flight.len() + self.pool.len()
    }

    fn snapshot(&self) -> LedgerSnapshot {
        let pending = self
            .in_flight
            .iter()
            .chain(self.pool.transactions())
            .cloned()
            .collect();
        LedgerSnapshot::new(self.chain.blocks().to_vec(), pending)
    }

    fn find_pending(&self, transaction_id: &str) -> Option<&Transaction> {
        self.in_flight
            .iter()
            .find(|tx| tx.transaction_id == transaction_id)
            .or_else(|| self.pool.get(transaction_id))
    }
}

/// State shared with seal tasks, which outlive the call that started them.
struct Shared {
    state: RwLock<LedgerState>,
    persistence: Arc<dyn Persistence>,
    persist_lock: Mutex<()>,
}

impl Shared {
    /// Saves a snapshot of the current state. Failures are logged and
    /// swallowed: the ledger keeps serving from memory until a later save
    /// succeeds.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.state.read().await.snapshot();
        let persistence = Arc::clone(&self.persistence);
        let saved = tokio::task::spawn_blocking(move || persistence.save_snapshot(&snapshot))
            .await
            .map_err(|e| LedgerError::PersistenceFailure(format!("save task failed: {}", e)))
            .and_then(|result| result);
        if let Err(e) = saved {
            warn!("Failed to persist ledger: {}", e);
        }
    }

    /// Mines `candidate`, confirms its transactions and appends it. On
    /// failure the in-flight transactions go back to the front of the pool.
    async fn complete_seal(&self, candidate: Block) -> Result<Block> {
        let started = Instant::now();
        let mined = tokio::task::spawn_blocking(move || mine_block(candidate))
            .await
            .map_err(|e| LedgerError::SealingAborted(format!("mining task failed: {}", e)))
            .and_then(|result| result);

        let mut block = match mined {
            Ok(block) => block,
            Err(e) => {
                error!("Sealing failed, returning transactions to the pool: {}", e);
                self.return_in_flight().await;
                return Err(e);
            }
        };

        let hash = block.hash.clone();
        for tx in block.transactions.iter_mut() {
            tx.confirm(block.index, &hash);
        }

        {
            let mut state = self.state.write().await;
            if let Err(e) = state.chain.append(block.clone()) {
                error!("Sealed block rejected by chain: {}", e);
                let drained = std::mem::take(&mut state.in_flight);
                state.pool.restore(drained);
                return Err(e);
            }
            state.in_flight.clear();
        }

        info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            transactions = block.transactions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Block sealed"
        );

        self.persist().await;
        Ok(block)
    }

    async fn return_in_flight(&self) {
        let mut state = self.state.write().await;
        let drained = std::mem::take(&mut state.in_flight);
        state.pool.restore(drained);
    }
}

pub struct LedgerService {
    settings: LedgerSettings,
    shared: Arc<Shared>,
    seal_lock: Arc<Mutex<()>>,
    trigger: OnceCell<mpsc::UnboundedSender<usize>>,
}

impl LedgerService {
    /// Loads the persisted ledger, falling back to a fresh genesis chain
    /// when nothing is stored, the store cannot be read, or the stored
    /// chain fails its integrity check.
    pub async fn initialize(
        persistence: Arc<dyn Persistence>,
        settings: LedgerSettings,
    ) -> Result<Self> {
        let restored = match persistence.load_snapshot() {
            Ok(Some(snapshot)) => Self::restore(snapshot, &settings),
            Ok(None) => {
                info!("no persisted ledger found, starting from genesis");
                None
            }
            Err(e) => {
                warn!("Failed to load ledger snapshot: {}. Creating new chain.", e);
                None
            }
        };

        let fresh = restored.is_none();
        let state = match restored {
            Some(state) => state,
            None => LedgerState {
                chain: HashChain::genesis(settings.genesis_difficulty)?,
                pool: Mempool::new(settings.max_transaction_bytes),
                in_flight: Vec::new(),
            },
        };

        let ledger = LedgerService {
            settings,
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                persistence,
                persist_lock: Mutex::new(()),
            }),
            seal_lock: Arc::new(Mutex::new(())),
            trigger: OnceCell::new(),
        };

        if fresh {
            ledger.persist().await;
        }
        Ok(ledger)
    }

    fn restore(snapshot: LedgerSnapshot, settings: &LedgerSettings) -> Option<LedgerState> {
        let chain = match HashChain::from_blocks(snapshot.blocks) {
            Ok(chain) => chain,
            Err(e) => {
                warn!("Persisted ledger unusable: {}. Creating new chain.", e);
                return None;
            }
        };

        let validation = chain.validate_with_min_difficulty(settings.required_work());
        if !validation.valid {
            error!(
                index = ?validation.invalid_index,
                "persisted chain failed integrity check: {}. Creating new chain.",
                validation.error.as_deref().unwrap_or_default()
            );
            return None;
        }

        let pool = Mempool::from_transactions(snapshot.pending_transactions, settings.max_transaction_bytes);
        info!(
            blocks = chain.len(),
            pending = pool.len(),
            "ledger restored from snapshot"
        );
        Some(LedgerState {
            chain,
            pool,
            in_flight: Vec::new(),
        })
    }

    /// Registers the channel the background sealer listens on. Only the
    /// first registration takes effect.
    pub fn attach_trigger(&self, trigger: mpsc::UnboundedSender<usize>) -> bool {
        self.trigger.set(trigger).is_ok()
    }

    fn notify_pending(&self, pending: usize) {
        if let Some(trigger) = self.trigger.get() {
            if trigger.send(pending).is_err() {
                debug!("seal scheduler is gone; submission will wait for a manual seal");
            }
        }
    }

    async fn persist(&self) {
        self.shared.persist().await;
    }

    /// Validates and queues a certificate anchor.
    pub async fn submit_certificate(&self, submission: CertificateSubmission) -> Result<Transaction> {
        let (tx, pending) = {
            let mut state = self.shared.state.write().await;
            let tx = state.pool.add(submission)?;
            (tx, state.pending_len())
        };

        info!(
            transaction_id = %tx.transaction_id,
            certificate_id = tx.certificate_id.as_deref().unwrap_or_default(),
            "Transaction created"
        );

        self.persist().await;
        self.notify_pending(pending);
        Ok(tx)
    }

    pub async fn store_certificate(&self, submission: CertificateSubmission) -> Result<StoreReceipt> {
        let tx = self.submit_certificate(submission).await?;
        Ok(StoreReceipt {
            transaction_id: tx.transaction_id,
            status: tx.status,
            message: "Certificate stored on ledger (pending confirmation)".to_string(),
        })
    }

    /// Seals every pending transaction into a new block. Returns `None`
    /// without touching the chain when the pool is empty.
    ///
    /// When `reward_recipient` is set a confirmed reward transaction is
    /// appended after the drained transactions.
    pub async fn seal_pending(&self, reward_recipient: Option<&str>) -> Result<Option<Block>> {
        let seal_guard = Arc::clone(&self.seal_lock).lock_owned().await;

        let candidate = {
            let mut state = self.shared.state.write().await;
            if state.pool.is_empty() && state.in_flight.is_empty() {
                return Ok(None);
            }
            let index = state.chain.len() as u64;
            let previous_hash = state.chain.latest()?.hash.clone();
            let mut transactions = std::mem::take(&mut state.in_flight);
            transactions.extend(state.pool.drain_all());
            state.in_flight = transactions.clone();

            if let Some(recipient) = reward_recipient {
                transactions.push(Transaction::reward(recipient, self.settings.reward_amount));
            }
            Block::new(index, previous_hash, self.settings.difficulty, transactions)
        };

        // Once drained, the seal finishes even if the caller stops waiting.
        let shared = Arc::clone(&self.shared);
        let sealing = tokio::spawn(async move {
            let _seal = seal_guard;
            shared.complete_seal(candidate).await
        });

        sealing
            .await
            .map_err(|e| LedgerError::SealingAborted(format!("sealing task failed: {}", e)))?
            .map(Some)
    }

    /// True while a seal holds the seal lock, including one whose caller
    /// has gone away.
    pub fn sealing_in_progress(&self) -> bool {
        self.seal_lock.try_lock().is_err()
    }

    /// Looks the hash up in sealed blocks only; pending anchors report as
    /// not found. The first match wins.
    pub async fn verify_by_hash(&self, certificate_hash: &str) -> VerificationResult {
        let state = self.shared.state.read().await;
        state
            .chain
            .search_by_certificate_hash(certificate_hash)
            .into_iter()
            .next()
            .map(VerificationResult::found)
            .unwrap_or_else(VerificationResult::not_found)
    }

    /// Confirmed transactions first, then pending ones with zero
    /// confirmations.
    pub async fn get_transaction(&self, transaction_id: &str) -> Option<TransactionRecord> {
        let state = self.shared.state.read().await;
        state
            .chain
            .search_by_transaction_id(transaction_id)
            .or_else(|| {
                state
                    .find_pending(transaction_id)
                    .cloned()
                    .map(TransactionRecord::pending)
            })
    }

    pub async fn search_by_certificate_id(&self, certificate_id: &str) -> Vec<TransactionRecord> {
        self.shared.state.read().await.chain.search_by_certificate_id(certificate_id)
    }

    pub async fn search_by_certificate_hash(&self, certificate_hash: &str) -> Vec<TransactionRecord> {
        self.shared.state.read().await.chain.search_by_certificate_hash(certificate_hash)
    }

    pub async fn search_by_learner(&self, learner_id: &str) -> Vec<TransactionRecord> {
        self.shared.state.read().await.chain.search_by_learner(learner_id)
    }

    pub async fn recent_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        self.shared.state.read().await.chain.recent_transactions(limit)
    }

    pub async fn get_block(&self, block_number: u64) -> Option<Block> {
        self.shared.state.read().await.chain.get(block_number).cloned()
    }

    pub async fn chain_len(&self) -> usize {
        self.shared.state.read().await.chain.len()
    }

    /// Transactions waiting for a seal, including any being sealed now.
    pub async fn pending_count(&self) -> usize {
        self.shared.state.read().await.pending_len()
    }

    pub async fn get_stats(&self) -> Result<LedgerStats> {
        let state = self.shared.state.read().await;
        let blocks = state.chain.blocks();

        let mut total_transactions = 0;
        let mut anchor_transactions = 0;
        let mut issuer_breakdown: BTreeMap<String, usize> = BTreeMap::new();
        let mut last_transaction_time = None;

        for tx in blocks.iter().flat_map(|block| block.transactions.iter()) {
            total_transactions += 1;
            last_transaction_time = last_transaction_time.max(Some(tx.timestamp));
            if tx.is_anchor() {
                anchor_transactions += 1;
                if let Some(issuer) = tx.issuer.as_deref() {
                    *issuer_breakdown.entry(issuer.to_string()).or_default() += 1;
                }
            }
        }

        Ok(LedgerStats {
            total_blocks: blocks.len(),
            total_transactions,
            anchor_transactions,
            pending_transactions: state.pending_len(),
            difficulty: self.settings.difficulty,
            unique_issuers: issuer_breakdown.len(),
            issuer_breakdown,
            last_transaction_time,
            latest_block: state.chain.latest()?.summary(),
        })
    }

    pub async fn validate_chain(&self) -> ChainValidation {
        let validation = self
            .shared
            .state
            .read()
            .await
            .chain
            .validate_with_min_difficulty(self.settings.required_work());
        if !validation.valid {
            error!(
                index = ?validation.invalid_index,
                "chain integrity violation: {}",
                validation.error.as_deref().unwrap_or_default()
            );
        }
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::GENESIS_PREVIOUS_HASH;
    use crate::miner::{meets_difficulty, recompute_hash};
    use crate::persistence::InMemoryPersistence;

    fn settings() -> LedgerSettings {
        LedgerSettings {
            difficulty: 1,
            ..LedgerSettings::default()
        }
    }

    async fn ledger_with(store: Arc<InMemoryPersistence>) -> LedgerService {
        LedgerService::initialize(store, settings()).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_ledger_persists_genesis() {
        let store = Arc::new(InMemoryPersistence::new());
        let ledger = ledger_with(store.clone()).await;
        assert_eq!(ledger.chain_len().await, 1);
        assert_eq!(store.save_count(), 1);

        let genesis = ledger.get_block(0).await.unwrap();
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.validate_chain().await.valid);
    }

    #[tokio::test]
    async fn test_submit_then_seal_confirms_in_block() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        let tx = ledger
            .submit_certificate(CertificateSubmission::new("C1", "abc123").with_issuer("Acme"))
            .await
            .unwrap();
        assert_eq!(ledger.pending_count().await, 1);

        let block = ledger.seal_pending(None).await.unwrap().unwrap();
        assert_eq!(block.index, 1);
        assert!(meets_difficulty(&block.hash, 1));
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].status, TransactionStatus::Confirmed);
        assert_eq!(block.transactions[0].block_hash.as_deref(), Some(block.hash.as_str()));
        assert_eq!(ledger.pending_count().await, 0);

        let record = ledger.get_transaction(&tx.transaction_id).await.unwrap();
        assert_eq!(record.transaction.block_number, Some(1));
        assert_eq!(record.confirmations, 0);
        assert!(ledger.validate_chain().await.valid);
    }

    #[tokio::test]
    async fn test_seal_with_reward_appends_confirmed_reward() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();

        let block = ledger.seal_pending(Some("system")).await.unwrap().unwrap();
        assert_eq!(block.transactions.len(), 2);
        let reward = &block.transactions[1];
        assert!(!reward.is_anchor());
        assert_eq!(reward.recipient.as_deref(), Some("system"));
        assert_eq!(reward.amount, Some(100));

        let stats = ledger.get_stats().await.unwrap();
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.anchor_transactions, 1);
    }

    #[tokio::test]
    async fn test_pending_lookup_has_zero_confirmations() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        let tx = ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
        let record = ledger.get_transaction(&tx.transaction_id).await.unwrap();
        assert_eq!(record.transaction.status, TransactionStatus::Pending);
        assert_eq!(record.confirmations, 0);
        assert!(ledger.get_transaction("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_stats_break_down_issuers() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        for (id, issuer) in [("C1", "Acme"), ("C2", "Acme"), ("C3", "Globex")] {
            ledger
                .submit_certificate(CertificateSubmission::new(id, format!("hash-{}", id)).with_issuer(issuer))
                .await
                .unwrap();
        }
        ledger.seal_pending(None).await.unwrap();
        ledger.submit_certificate(CertificateSubmission::new("C4", "hash-C4")).await.unwrap();

        let stats = ledger.get_stats().await.unwrap();
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.anchor_transactions, 3);
        assert_eq!(stats.pending_transactions, 1);
        assert_eq!(stats.unique_issuers, 2);
        assert_eq!(stats.issuer_breakdown.get("Acme"), Some(&2));
        assert_eq!(stats.difficulty, 1);
        assert_eq!(stats.latest_block.index, 1);
        assert!(stats.last_transaction_time.is_some());
    }

    #[tokio::test]
    async fn test_reload_restores_chain_and_pool() {
        let store = Arc::new(InMemoryPersistence::new());
        {
            let ledger = ledger_with(store.clone()).await;
            ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
            ledger.seal_pending(None).await.unwrap();
            ledger.submit_certificate(CertificateSubmission::new("C2", "h2")).await.unwrap();
        }

        let reloaded = ledger_with(store).await;
        assert_eq!(reloaded.chain_len().await, 2);
        assert_eq!(reloaded.pending_count().await, 1);
        assert!(reloaded.verify_by_hash("h1").await.verified);
        assert!(!reloaded.verify_by_hash("h2").await.verified);
    }

    #[tokio::test]
    async fn test_tampered_snapshot_falls_back_to_genesis() {
        let store = Arc::new(InMemoryPersistence::new());
        {
            let ledger = ledger_with(store.clone()).await;
            ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
            ledger.seal_pending(None).await.unwrap();
        }

        let mut snapshot = store.snapshot().unwrap();
        snapshot.blocks[1].transactions[0].certificate_hash = Some("forged".to_string());
        let tampered = Arc::new(InMemoryPersistence::with_snapshot(snapshot));

        let ledger = ledger_with(tampered).await;
        assert_eq!(ledger.chain_len().await, 1);
        assert!(!ledger.verify_by_hash("forged").await.verified);
    }

    #[tokio::test]
    async fn test_restore_rejects_block_reworked_below_required_work() {
        let store = Arc::new(InMemoryPersistence::new());
        {
            let ledger = ledger_with(store.clone()).await;
            ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
            ledger.seal_pending(None).await.unwrap();
        }

        let mut snapshot = store.snapshot().unwrap();
        let block = &mut snapshot.blocks[1];
        block.transactions[0].certificate_hash = Some("forged".to_string());
        block.difficulty = 0;
        block.nonce = 0;
        while recompute_hash(block).starts_with('0') {
            block.nonce += 1;
        }
        block.hash = recompute_hash(block);

        let ledger = ledger_with(Arc::new(InMemoryPersistence::with_snapshot(snapshot))).await;
        assert_eq!(ledger.chain_len().await, 1);
        assert!(!ledger.verify_by_hash("forged").await.verified);
    }

    #[tokio::test]
    async fn test_seal_merges_leftover_in_flight() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        let first = ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();

        // Leftovers from a seal task that never finished.
        {
            let mut state = ledger.shared.state.write().await;
            state.in_flight = state.pool.drain_all();
        }
        ledger.submit_certificate(CertificateSubmission::new("C2", "h2")).await.unwrap();

        let block = ledger.seal_pending(None).await.unwrap().unwrap();
        let ids: Vec<_> = block.transactions.iter().map(|tx| tx.transaction_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], first.transaction_id);
        assert_eq!(ledger.pending_count().await, 0);
        assert!(ledger.seal_pending(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trigger_receives_pending_count() {
        let ledger = ledger_with(Arc::new(InMemoryPersistence::new())).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(ledger.attach_trigger(tx));

        ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
        ledger.submit_certificate(CertificateSubmission::new("C2", "h2")).await.unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));

        let (other, _rx) = mpsc::unbounded_channel();
        assert!(!ledger.attach_trigger(other));
    }
}
