//! Linear scans over confirmed transactions.
//!
//! Every lookup walks all blocks. That is fine at the sizes this ledger
//! targets; a larger deployment would keep a `certificate_hash ->
//! (block, offset)` index updated on append.

use crate::blockchain::core::chain::{Block, HashChain};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// A confirmed transaction enriched with its block coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub confirmations: u64,
}

impl TransactionRecord {
    pub fn pending(transaction: Transaction) -> Self {
        TransactionRecord {
            transaction,
            confirmations: 0,
        }
    }
}

impl HashChain {
    fn record(&self, block: &Block, tx: &Transaction) -> TransactionRecord {
        let mut transaction = tx.clone();
        transaction.block_number = Some(block.index);
        transaction.block_hash = Some(block.hash.clone());
        TransactionRecord {
            transaction,
            confirmations: self.confirmations(block.index),
        }
    }

    fn scan<F>(&self, matches: F) -> Vec<TransactionRecord>
    where
        F: Fn(&Transaction) -> bool,
    {
        let mut records = Vec::new();
        for block in self.blocks() {
            for tx in block.transactions.iter().filter(|tx| matches(*tx)) {
                records.push(self.record(block, tx));
            }
        }
        records
    }

    pub fn search_by_certificate_id(&self, certificate_id: &str) -> Vec<TransactionRecord> {
        self.scan(|tx| tx.certificate_id.as_deref() == Some(certificate_id))
    }

    pub fn search_by_certificate_hash(&self, certificate_hash: &str) -> Vec<TransactionRecord> {
        self.scan(|tx| tx.certificate_hash.as_deref() == Some(certificate_hash))
    }

    pub fn search_by_transaction_id(&self, transaction_id: &str) -> Option<TransactionRecord> {
        self.scan(|tx| tx.transaction_id == transaction_id)
            .into_iter()
            .next()
    }

    /// Case-insensitive match on the learner field.
    pub fn search_by_learner(&self, learner_id: &str) -> Vec<TransactionRecord> {
        let wanted = learner_id.to_lowercase();
        self.scan(|tx| {
            tx.learner_id
                .as_deref()
                .is_some_and(|l| l.to_lowercase() == wanted)
        })
    }

    /// Most recent confirmed transactions first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionRecord> {
        self.blocks()
            .iter()
            .rev()
            .flat_map(|block| block.transactions.iter().rev().map(move |tx| (block, tx)))
            .take(limit)
            .map(|(block, tx)| self.record(block, tx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::mine_block;
    use crate::transaction::CertificateSubmission;

    fn chain_with(submissions: Vec<Vec<CertificateSubmission>>) -> HashChain {
        let mut chain = HashChain::genesis(0).unwrap();
        for batch in submissions {
            let latest = chain.latest().unwrap().hash.clone();
            let txs = batch.into_iter().map(Transaction::pending).collect();
            let block = mine_block(Block::new(chain.len() as u64, latest, 0, txs)).unwrap();
            chain.append(block).unwrap();
        }
        chain
    }

    #[test]
    fn test_search_by_hash_enriches_records() {
        let chain = chain_with(vec![
            vec![CertificateSubmission::new("C1", "h1")],
            vec![CertificateSubmission::new("C2", "h2")],
        ]);
        let found = chain.search_by_certificate_hash("h1");
        assert_eq!(found.len(), 1);
        let record = &found[0];
        assert_eq!(record.transaction.block_number, Some(1));
        assert_eq!(record.transaction.block_hash.as_deref(), Some(chain.blocks()[1].hash.as_str()));
        assert_eq!(record.confirmations, 1);
        assert!(chain.search_by_certificate_hash("missing").is_empty());
    }

    #[test]
    fn test_search_by_certificate_id_returns_all_matches() {
        let chain = chain_with(vec![
            vec![CertificateSubmission::new("C1", "h1")],
            vec![CertificateSubmission::new("C1", "h1-reissued")],
        ]);
        let found = chain.search_by_certificate_id("C1");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].transaction.block_number, Some(1));
        assert_eq!(found[1].transaction.block_number, Some(2));
    }

    #[test]
    fn test_search_by_transaction_id() {
        let chain = chain_with(vec![vec![CertificateSubmission::new("C1", "h1")]]);
        let id = chain.blocks()[1].transactions[0].transaction_id.clone();
        let record = chain.search_by_transaction_id(&id).unwrap();
        assert_eq!(record.transaction.certificate_id.as_deref(), Some("C1"));
        assert!(chain.search_by_transaction_id("nope").is_none());
    }

    #[test]
    fn test_search_by_learner_ignores_case() {
        let chain = chain_with(vec![vec![
            CertificateSubmission::new("C1", "h1").with_learner("Asha@Example.org"),
            CertificateSubmission::new("C2", "h2").with_learner("someone@example.org"),
        ]]);
        assert_eq!(chain.search_by_learner("asha@example.org").len(), 1);
    }

    #[test]
    fn test_recent_transactions_newest_first() {
        let chain = chain_with(vec![
            vec![CertificateSubmission::new("C1", "h1")],
            vec![
                CertificateSubmission::new("C2", "h2"),
                CertificateSubmission::new("C3", "h3"),
            ],
        ]);
        let recent = chain.recent_transactions(2);
        let ids: Vec<_> = recent
            .iter()
            .map(|r| r.transaction.certificate_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["C3".to_string(), "C2".to_string()]);
    }
}
