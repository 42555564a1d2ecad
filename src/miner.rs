//! Proof-of-work sealing
//!
//! The search is a pure function of the candidate block: nonces are tried
//! in order `0, 1, 2, ...` until the block hash has at least `difficulty`
//! leading `'0'` hex digits. Nothing here touches shared state, so callers
//! run it on a blocking worker and only take locks to append the result.

use crate::blockchain::Block;
use crate::crypto::{leading_zero_digits, Sha256Hash};
use crate::error::{LedgerError, Result};
use crate::transaction::serialize_contents;
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::debug;

/// A SHA-256 digest has 64 hex digits.
pub const MAX_DIFFICULTY: u32 = 64;

/// Hasher primed with every hashed field except the nonce.
fn prefix_hasher(block: &Block) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(block.index.to_string().as_bytes());
    hasher.update(block.previous_hash.as_bytes());
    hasher.update(block.timestamp.to_string().as_bytes());
    hasher.update(serialize_contents(&block.transactions));
    hasher
}

/// `H(index ‖ previousHash ‖ timestamp ‖ serialize(transactions) ‖ nonce)`
pub fn calculate_hash(block: &Block) -> Sha256Hash {
    let mut hasher = prefix_hasher(block);
    hasher.update(block.nonce.to_string().as_bytes());
    hasher.finalize().into()
}

/// Recomputes a block's hash from its stored fields, hex encoded.
pub fn recompute_hash(block: &Block) -> String {
    hex::encode(calculate_hash(block))
}

/// True when `hash` (hex) starts with at least `difficulty` zeros.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    hash.bytes().take_while(|b| *b == b'0').count() >= difficulty as usize
}

/// Searches for a nonce that satisfies `block.difficulty` and returns the
/// sealed block. The search starts from nonce 0 regardless of the
/// candidate's current nonce.
pub fn mine_block(mut block: Block) -> Result<Block> {
    if block.difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::SealingAborted(format!(
            "difficulty {} exceeds maximum {}",
            block.difficulty, MAX_DIFFICULTY
        )));
    }

    let started = Instant::now();
    let base = prefix_hasher(&block);
    let mut nonce: u64 = 0;

    loop {
        let digest: Sha256Hash = base
            .clone()
            .chain_update(nonce.to_string().as_bytes())
            .finalize()
            .into();

        if leading_zero_digits(&digest) >= block.difficulty {
            block.nonce = nonce;
            block.hash = hex::encode(digest);
            debug!(
                index = block.index,
                nonce,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "block sealed: {}",
                block.hash
            );
            return Ok(block);
        }

        nonce = nonce.checked_add(1).ok_or_else(|| {
            LedgerError::SealingAborted(format!(
                "nonce space exhausted for block {}",
                block.index
            ))
        })?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{CertificateSubmission, Transaction};

    fn candidate(difficulty: u32) -> Block {
        let txs = vec![Transaction::pending(CertificateSubmission::new("CERT-1", "abc123"))];
        Block::new(1, "0".repeat(64), difficulty, txs)
    }

    #[test]
    fn test_mined_block_meets_difficulty() {
        let block = mine_block(candidate(2)).unwrap();
        assert!(block.hash.starts_with("00"));
        assert!(meets_difficulty(&block.hash, 2));
    }

    #[test]
    fn test_recompute_matches_sealing() {
        let block = mine_block(candidate(1)).unwrap();
        assert_eq!(recompute_hash(&block), block.hash);
    }

    #[test]
    fn test_search_is_deterministic() {
        let block = candidate(2);
        let first = mine_block(block.clone()).unwrap();
        let second = mine_block(block).unwrap();
        assert_eq!(first.nonce, second.nonce);
        assert_eq!(first.hash, second.hash);
    }

    #[test]
    fn test_zero_difficulty_takes_first_nonce() {
        let block = mine_block(candidate(0)).unwrap();
        assert_eq!(block.nonce, 0);
        assert_eq!(block.hash.len(), 64);
    }

    #[test]
    fn test_nonce_changes_hash() {
        let mut block = mine_block(candidate(1)).unwrap();
        let sealed = block.hash.clone();
        block.nonce += 1;
        assert_ne!(recompute_hash(&block), sealed);
    }

    #[test]
    fn test_impossible_difficulty_rejected() {
        assert!(matches!(
            mine_block(candidate(MAX_DIFFICULTY + 1)),
            Err(LedgerError::SealingAborted(_))
        ));
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("00ab", 2));
        assert!(!meets_difficulty("0ab0", 2));
        assert!(meets_difficulty("abcd", 0));
    }
}
