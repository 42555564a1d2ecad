//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use serde_json::json;

    #[test]
    fn test_submission_validation_success() {
        let submission = CertificateSubmission::new("CERT-1", "abc123")
            .with_issuer("Skill Council")
            .with_learner("learner-7");
        assert!(submission.validate().is_ok());
    }

    #[test]
    fn test_missing_certificate_hash_fails() {
        let submission = CertificateSubmission::new("CERT-1", "   ");
        match submission.validate() {
            Err(LedgerError::InvalidTransaction(msg)) => assert!(msg.contains("certificateHash")),
            other => panic!("expected InvalidTransaction, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_certificate_id_fails() {
        let submission = CertificateSubmission::new("", "abc123");
        assert!(matches!(
            submission.validate(),
            Err(LedgerError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_reward_submission_rejected() {
        let mut submission = CertificateSubmission::new("CERT-1", "abc123");
        submission.kind = Some(TransactionKind::Reward);
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_pending_transaction_fields() {
        let tx = Transaction::pending(CertificateSubmission::new(" CERT-1 ", "abc123"));
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.kind, TransactionKind::CertificateAnchor);
        assert_eq!(tx.certificate_id.as_deref(), Some("CERT-1"));
        assert_eq!(tx.transaction_id.len(), 32);
        assert!(tx.block_number.is_none());
        assert!(tx.timestamp > 0);
    }

    #[test]
    fn test_confirmation_does_not_change_content() {
        let mut tx = Transaction::pending(
            CertificateSubmission::new("CERT-1", "abc123").with_metadata("nsqfLevel", json!(4)),
        );
        let before = serialize_contents(std::slice::from_ref(&tx));
        tx.confirm(3, "00ff");
        let after = serialize_contents(std::slice::from_ref(&tx));
        assert_eq!(before, after);
        assert_eq!(tx.block_number, Some(3));
        assert!(!tx.is_pending());
    }

    #[test]
    fn test_oversized_transaction_rejected() {
        let tx = Transaction::pending(
            CertificateSubmission::new("CERT-1", "abc123")
                .with_metadata("blob", json!("x".repeat(2_000))),
        );
        assert!(tx.validate_size(1_000).is_err());
        assert!(tx.validate_size(MAX_TRANSACTION_SIZE).is_ok());
    }

    #[test]
    fn test_kind_serialization() {
        let anchor = serde_json::to_string(&TransactionKind::CertificateAnchor).unwrap();
        assert_eq!(anchor, "\"certificate_anchor\"");

        let other: TransactionKind = serde_json::from_str("\"revocation_notice\"").unwrap();
        assert_eq!(other, TransactionKind::Other("revocation_notice".to_string()));

        let reward: TransactionKind = serde_json::from_str("\"reward\"").unwrap();
        assert_eq!(reward, TransactionKind::Reward);
    }

    #[test]
    fn test_submission_deserializes_from_camel_case() {
        let submission: CertificateSubmission = serde_json::from_value(json!({
            "certificateId": "CERT-9",
            "certificateHash": "feed",
            "issuer": "Institute",
            "metadata": { "skillAreas": ["welding"] }
        }))
        .unwrap();
        assert_eq!(submission.certificate_id, "CERT-9");
        assert_eq!(submission.issuer.as_deref(), Some("Institute"));
        assert!(submission.kind.is_none());
        assert!(submission.metadata.contains_key("skillAreas"));
    }
}
