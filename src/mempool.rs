//! Pending transaction pool
//!
//! Holds submitted transactions until a seal drains them. Insertion order
//! is preserved and becomes the order of the transactions in the block.
//! The pool itself is not synchronized; the ledger serializes access.

use crate::error::{LedgerError, Result};
use crate::transaction::{CertificateSubmission, Transaction};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
    by_id: HashMap<String, usize>,
    max_transaction_bytes: usize,
}

impl Mempool {
    pub fn new(max_transaction_bytes: usize) -> Self {
        Self {
            transactions: Vec::new(),
            by_id: HashMap::new(),
            max_transaction_bytes,
        }
    }

    /// Restores a pool from persisted pending transactions, dropping
    /// duplicates and anything not pending.
    pub fn from_transactions(transactions: Vec<Transaction>, max_transaction_bytes: usize) -> Self {
        let mut pool = Self::new(max_transaction_bytes);
        for tx in transactions.into_iter().filter(Transaction::is_pending) {
            if !pool.by_id.contains_key(&tx.transaction_id) {
                pool.push(tx);
            }
        }
        pool
    }

    /// Validates a submission and stores it as a pending transaction.
    pub fn add(&mut self, submission: CertificateSubmission) -> Result<Transaction> {
        submission.validate()?;

        let tx = Transaction::pending(submission);
        tx.validate_size(self.max_transaction_bytes)?;

        if self.by_id.contains_key(&tx.transaction_id) {
            return Err(LedgerError::InvalidTransaction(format!(
                "duplicate transaction id {}",
                tx.transaction_id
            )));
        }

        self.push(tx.clone());
        Ok(tx)
    }

    fn push(&mut self, tx: Transaction) {
        self.by_id.insert(tx.transaction_id.clone(), self.transactions.len());
        self.transactions.push(tx);
    }

    /// Removes and returns every pending transaction in submission order.
    pub fn drain_all(&mut self) -> Vec<Transaction> {
        self.by_id.clear();
        std::mem::take(&mut self.transactions)
    }

    /// Puts drained transactions back ahead of anything submitted since.
    pub fn restore(&mut self, drained: Vec<Transaction>) {
        let newer = self.drain_all();
        for tx in drained.into_iter().chain(newer) {
            if !self.by_id.contains_key(&tx.transaction_id) {
                self.push(tx);
            }
        }
    }

    pub fn get(&self, transaction_id: &str) -> Option<&Transaction> {
        self.by_id
            .get(transaction_id)
            .and_then(|&i| self.transactions.get(i))
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.by_id.contains_key(transaction_id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
