/// Transaction types for the certificate ledger
use crate::crypto::generate_transaction_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default cap on a serialized submission (100KB).
pub const MAX_TRANSACTION_SIZE: usize = 100_000;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// What a transaction records. The set is open: unknown kinds round-trip
/// through `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[default]
    CertificateAnchor,
    Reward,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::CertificateAnchor => write!(f, "certificate_anchor"),
            TransactionKind::Reward => write!(f, "reward"),
            TransactionKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
}

/// Caller-supplied data for anchoring a certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSubmission {
    #[serde(default)]
    pub certificate_id: String,
    #[serde(default)]
    pub certificate_hash: String,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub learner_id: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl CertificateSubmission {
    pub fn new(certificate_id: impl Into<String>, certificate_hash: impl Into<String>) -> Self {
        Self {
            certificate_id: certificate_id.into(),
            certificate_hash: certificate_hash.into(),
            ..Default::default()
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_learner(mut self, learner_id: impl Into<String>) -> Self {
        self.learner_id = Some(learner_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A ledger transaction.
///
/// Created pending by a submission, it becomes confirmed exactly once,
/// when the block that includes it is sealed. `block_number` and
/// `block_hash` are only set once confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub status: TransactionStatus,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// The sealed content of a transaction: everything except the
/// confirmation fields, which are only known after sealing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionContent<'a> {
    pub transaction_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a TransactionKind,
    pub certificate_id: Option<&'a str>,
    pub certificate_hash: Option<&'a str>,
    pub learner_id: Option<&'a str>,
    pub issuer: Option<&'a str>,
    pub title: Option<&'a str>,
    pub metadata: &'a BTreeMap<String, Value>,
    pub amount: Option<u64>,
    pub recipient: Option<&'a str>,
    pub timestamp: u64,
}

impl Transaction {
    /// Builds a pending transaction from a submission, assigning a fresh
    /// identifier and the current time.
    pub fn pending(submission: CertificateSubmission) -> Self {
        Transaction {
            transaction_id: generate_transaction_id(),
            kind: submission.kind.unwrap_or_default(),
            certificate_id: Some(submission.certificate_id.trim().to_string()),
            certificate_hash: Some(submission.certificate_hash.trim().to_string()),
            learner_id: submission.learner_id,
            issuer: submission.issuer,
            title: submission.title,
            metadata: submission.metadata,
            amount: None,
            recipient: None,
            status: TransactionStatus::Pending,
            timestamp: now_millis(),
            block_number: None,
            block_hash: None,
        }
    }

    /// Synthetic reward entry appended by the sealer. Already confirmed;
    /// the block coordinates are filled in once the block is sealed.
    pub fn reward(recipient: impl Into<String>, amount: u64) -> Self {
        Transaction {
            transaction_id: generate_transaction_id(),
            kind: TransactionKind::Reward,
            certificate_id: None,
            certificate_hash: None,
            learner_id: None,
            issuer: None,
            title: None,
            metadata: BTreeMap::new(),
            amount: Some(amount),
            recipient: Some(recipient.into()),
            status: TransactionStatus::Confirmed,
            timestamp: now_millis(),
            block_number: None,
            block_hash: None,
        }
    }

    pub fn content(&self) -> TransactionContent<'_> {
        TransactionContent {
            transaction_id: &self.transaction_id,
            kind: &self.kind,
            certificate_id: self.certificate_id.as_deref(),
            certificate_hash: self.certificate_hash.as_deref(),
            learner_id: self.learner_id.as_deref(),
            issuer: self.issuer.as_deref(),
            title: self.title.as_deref(),
            metadata: &self.metadata,
            amount: self.amount,
            recipient: self.recipient.as_deref(),
            timestamp: self.timestamp,
        }
    }

    pub fn confirm(&mut self, block_number: u64, block_hash: &str) {
        self.status = TransactionStatus::Confirmed;
        self.block_number = Some(block_number);
        self.block_hash = Some(block_hash.to_string());
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == TransactionKind::CertificateAnchor
    }
}

/// Serializes the sealed content of `transactions` for hashing.
pub fn serialize_contents(transactions: &[Transaction]) -> Vec<u8> {
    let contents: Vec<TransactionContent<'_>> = transactions.iter().map(Transaction::content).collect();
    // Plain structs, string-keyed maps and JSON values cannot fail to serialize.
    serde_json::to_vec(&contents).unwrap_or_default()
}
