/// Validation logic for submissions separated from type definitions
use crate::error::{LedgerError, Result};
use crate::transaction::types::{CertificateSubmission, Transaction, TransactionKind};

/// Maximum length of a certificate identifier or hash.
pub const MAX_FIELD_LENGTH: usize = 256;

impl CertificateSubmission {
    /// Stateless validation of caller-supplied fields.
    pub fn validate(&self) -> Result<()> {
        if self.certificate_id.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "certificateId is required".to_string(),
            ));
        }
        if self.certificate_hash.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "certificateHash is required".to_string(),
            ));
        }

        for (name, value) in [
            ("certificateId", &self.certificate_id),
            ("certificateHash", &self.certificate_hash),
        ] {
            if value.len() > MAX_FIELD_LENGTH {
                return Err(LedgerError::InvalidTransaction(format!(
                    "{} exceeds maximum length of {} characters",
                    name, MAX_FIELD_LENGTH
                )));
            }
        }

        // Rewards are only ever minted by the sealer.
        if matches!(self.kind, Some(TransactionKind::Reward)) {
            return Err(LedgerError::InvalidTransaction(
                "reward transactions cannot be submitted".to_string(),
            ));
        }

        Ok(())
    }
}

impl Transaction {
    /// Rejects transactions whose encoded size exceeds `max_bytes`.
    pub fn validate_size(&self, max_bytes: usize) -> Result<()> {
        let size = bincode::serialized_size(&self.content())?;

        if size as usize > max_bytes {
            return Err(LedgerError::InvalidTransaction(format!(
                "Transaction too large: {} bytes (max: {})",
                size, max_bytes
            )));
        }
        Ok(())
    }
}
