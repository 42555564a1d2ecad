use crate::blockchain::core::chain::{HashChain, GENESIS_PREVIOUS_HASH};
use crate::miner::{meets_difficulty, recompute_hash};
use serde::{Deserialize, Serialize};

/// Outcome of a full integrity walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_index: Option<u64>,
}

impl ChainValidation {
    pub fn ok() -> Self {
        ChainValidation {
            valid: true,
            error: None,
            invalid_index: None,
        }
    }

    pub fn violation(index: u64, error: String) -> Self {
        ChainValidation {
            valid: false,
            error: Some(error),
            invalid_index: Some(index),
        }
    }
}

impl HashChain {
    /// Walks every block and reports the first violation: a stored hash that
    /// does not match its recomputation, a broken link, an out-of-place
    /// index or a hash below its recorded difficulty.
    pub fn validate_integrity(&self) -> ChainValidation {
        self.validate_with_min_difficulty(0)
    }

    /// Like [`validate_integrity`](Self::validate_integrity), but every block
    /// after genesis must also carry at least `min_difficulty` leading zeros.
    /// A block's `difficulty` is not hashed, so it cannot vouch for itself.
    pub fn validate_with_min_difficulty(&self, min_difficulty: u32) -> ChainValidation {
        let blocks = self.blocks();

        for (i, block) in blocks.iter().enumerate() {
            let index = i as u64;

            if block.index != index {
                return ChainValidation::violation(
                    index,
                    format!("Invalid index at block {}: found {}", i, block.index),
                );
            }

            if block.hash != recompute_hash(block) {
                return ChainValidation::violation(index, format!("Invalid hash at block {}", i));
            }

            let expected_previous = match i {
                0 => GENESIS_PREVIOUS_HASH,
                _ => blocks[i - 1].hash.as_str(),
            };
            if block.previous_hash != expected_previous {
                return ChainValidation::violation(
                    index,
                    format!("Invalid previous hash at block {}", i),
                );
            }

            let required = match i {
                0 => block.difficulty,
                _ => block.difficulty.max(min_difficulty),
            };
            if !meets_difficulty(&block.hash, required) {
                return ChainValidation::violation(
                    index,
                    format!(
                        "Insufficient proof of work at block {} (difficulty {})",
                        i, required
                    ),
                );
            }
        }

        ChainValidation::ok()
    }
}
