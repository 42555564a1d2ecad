//! Hashing primitives for the certificate ledger

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// Size of a transaction identifier in bytes (128 bits).
pub const TRANSACTION_ID_BYTES: usize = 16;

/// SHA-256 of arbitrary bytes, hex encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Generates a random 128-bit transaction identifier as 32 hex characters.
pub fn generate_transaction_id() -> String {
    let mut bytes = [0u8; TRANSACTION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Counts the leading `'0'` characters of the hex rendering of `hash`.
pub fn leading_zero_digits(hash: &Sha256Hash) -> u32 {
    let mut total = 0u32;
    for byte in hash {
        if *byte == 0 {
            total += 2;
        } else {
            if *byte < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

/// Identifying fields of an issued certificate.
///
/// The anchor hash of a certificate is derived from these fields so that
/// issuers and verifiers compute the same value independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    pub certificate_id: String,
    pub learner_id: String,
    pub issuer: String,
    pub title: String,
    pub issue_date: String,
    #[serde(default)]
    pub verification_type: Option<String>,
}

/// Canonical SHA-256 (hex) of a certificate's identifying fields.
pub fn certificate_hash(fields: &CertificateFields) -> String {
    // Field order is fixed by the struct definition.
    let canonical = serde_json::to_vec(fields).unwrap_or_default();
    sha256_hex(&canonical)
}
