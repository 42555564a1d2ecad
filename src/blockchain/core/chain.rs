use crate::error::{LedgerError, Result};
use crate::miner::mine_block;
use crate::transaction::{now_millis, Transaction};
use serde::{Deserialize, Serialize};
use tracing::info;

/// `previousHash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A sealed, immutable batch of transactions.
///
/// `hash` covers `index`, `previous_hash`, `timestamp`, the transactions'
/// content and `nonce`. `difficulty` records the target the block was
/// sealed at and is not part of the hash input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
    #[serde(default)]
    pub difficulty: u32,
}

impl Block {
    /// Unsealed candidate stamped with the current time. Only
    /// [`mine_block`] turns it into a valid block.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        difficulty: u32,
        transactions: Vec<Transaction>,
    ) -> Self {
        Block {
            index,
            timestamp: now_millis(),
            transactions,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
            difficulty,
        }
    }

    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            index: self.index,
            hash: self.hash.clone(),
            previous_hash: self.previous_hash.clone(),
            timestamp: self.timestamp,
            nonce: self.nonce,
            difficulty: self.difficulty,
            transaction_count: self.transactions.len(),
        }
    }
}

/// Header-only view of a block for stats and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub index: u64,
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: u64,
    pub nonce: u64,
    pub difficulty: u32,
    pub transaction_count: usize,
}

/// Append-only, hash-linked sequence of blocks. Never empty: every
/// constructor starts from a genesis block.
#[derive(Debug, Clone, PartialEq)]
pub struct HashChain {
    blocks: Vec<Block>,
}

impl HashChain {
    /// Creates a chain holding only a freshly sealed genesis block.
    pub fn genesis(difficulty: u32) -> Result<Self> {
        let genesis = Self::genesis_block(difficulty)?;
        info!(hash = %genesis.hash, "genesis block created");
        Ok(HashChain {
            blocks: vec![genesis],
        })
    }

    pub fn genesis_block(difficulty: u32) -> Result<Block> {
        mine_block(Block::new(0, GENESIS_PREVIOUS_HASH, difficulty, Vec::new()))
    }

    /// Rebuilds a chain from persisted blocks. Linkage is not checked here;
    /// call [`HashChain::validate_integrity`] on the result.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::ChainInconsistency(
                "cannot rebuild a chain from zero blocks".to_string(),
            ));
        }
        Ok(HashChain { blocks })
    }

    pub fn append(&mut self, block: Block) -> Result<()> {
        let latest = self.latest()?;
        let expected_index = self.blocks.len() as u64;

        if block.index != expected_index {
            return Err(LedgerError::ChainInconsistency(format!(
                "invalid block index. Expected {}, but got {}",
                expected_index, block.index
            )));
        }

        if block.previous_hash != latest.hash {
            return Err(LedgerError::ChainInconsistency(format!(
                "invalid previous block hash. Expected {}, but got {}",
                latest.hash, block.previous_hash
            )));
        }

        self.blocks.push(block);
        Ok(())
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks
            .last()
            .ok_or_else(|| LedgerError::ChainInconsistency("chain is empty".to_string()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks appended after `block_number`.
    pub fn confirmations(&self, block_number: u64) -> u64 {
        (self.blocks.len() as u64).saturating_sub(block_number + 1)
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}
