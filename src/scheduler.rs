//! Background auto-sealing
//!
//! Every accepted submission sends the current pending count to the
//! scheduler. The first trigger opens a debounce window of `delay`; later
//! triggers inside the window fold into the same seal, and a pool that
//! reaches `max_pending` is sealed without waiting out the window.
//!
//! Cancellation is only observed between seals. A seal that has started
//! proof-of-work always runs to completion.

use crate::config::SealingConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealPolicy {
    pub delay: Duration,
    pub max_pending: usize,
    pub reward_recipient: Option<String>,
}

impl From<&SealingConfig> for SealPolicy {
    fn from(config: &SealingConfig) -> Self {
        SealPolicy {
            delay: config.delay,
            max_pending: config.max_pending.max(1),
            reward_recipient: config.reward_recipient.clone(),
        }
    }
}

pub struct SealScheduler {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl SealScheduler {
    /// Attaches a trigger channel to `ledger` and starts the sealing task.
    /// Fails if the ledger already has a scheduler.
    pub fn spawn(
        ledger: Arc<LedgerService>,
        policy: SealPolicy,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let (trigger, triggers) = mpsc::unbounded_channel();
        if !ledger.attach_trigger(trigger) {
            return Err(LedgerError::Config(
                "ledger already has a seal scheduler attached".to_string(),
            ));
        }

        info!(
            delay = %humantime::format_duration(policy.delay),
            max_pending = policy.max_pending,
            "seal scheduler started"
        );
        let handle = tokio::spawn(run(ledger, policy, triggers, cancel.clone()));
        Ok(SealScheduler { handle, cancel })
    }

    /// Stops accepting triggers and waits for any running seal to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!("seal scheduler task failed: {}", e);
        }
    }
}

async fn run(
    ledger: Arc<LedgerService>,
    policy: SealPolicy,
    mut triggers: mpsc::UnboundedReceiver<usize>,
    cancel: CancellationToken,
) {
    loop {
        let pending = tokio::select! {
            _ = cancel.cancelled() => break,
            received = triggers.recv() => match received {
                Some(pending) => pending,
                None => break,
            },
        };

        if pending < policy.max_pending && !debounce(&policy, &mut triggers, &cancel).await {
            break;
        }

        // Anything queued so far refers to transactions this seal will drain.
        while triggers.try_recv().is_ok() {}

        match ledger.seal_pending(policy.reward_recipient.as_deref()).await {
            Ok(Some(block)) => debug!(index = block.index, "auto-seal complete"),
            Ok(None) => debug!("auto-seal found an empty pool"),
            Err(e) => error!("auto-seal failed: {}", e),
        }
    }
    info!("seal scheduler stopped");
}

/// Waits out the debounce window. Returns `false` if cancelled.
async fn debounce(
    policy: &SealPolicy,
    triggers: &mut mpsc::UnboundedReceiver<usize>,
    cancel: &CancellationToken,
) -> bool {
    let window = sleep(policy.delay);
    tokio::pin!(window);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = &mut window => return true,
            received = triggers.recv() => match received {
                Some(pending) if pending >= policy.max_pending => return true,
                Some(_) => continue,
                None => return true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerSettings;
    use crate::persistence::InMemoryPersistence;
    use crate::transaction::CertificateSubmission;

    async fn ledger() -> Arc<LedgerService> {
        ledger_at(1).await
    }

    async fn ledger_at(difficulty: u32) -> Arc<LedgerService> {
        let settings = LedgerSettings {
            difficulty,
            ..LedgerSettings::default()
        };
        Arc::new(
            LedgerService::initialize(Arc::new(InMemoryPersistence::new()), settings)
                .await
                .unwrap(),
        )
    }

    fn policy(delay: Duration, max_pending: usize) -> SealPolicy {
        SealPolicy {
            delay,
            max_pending,
            reward_recipient: None,
        }
    }

    async fn wait_for_chain_len(ledger: &LedgerService, len: usize) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while ledger.chain_len().await < len || ledger.pending_count().await > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("auto-seal did not happen in time");
    }

    #[tokio::test]
    async fn test_submissions_in_window_share_one_block() {
        let ledger = ledger().await;
        let scheduler = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_millis(200), 50),
            CancellationToken::new(),
        )
        .unwrap();

        for n in 0..3 {
            ledger
                .submit_certificate(CertificateSubmission::new(format!("C{}", n), format!("h{}", n)))
                .await
                .unwrap();
        }

        wait_for_chain_len(&ledger, 2).await;
        assert_eq!(ledger.chain_len().await, 2);
        assert_eq!(ledger.get_block(1).await.unwrap().transactions.len(), 3);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_threshold_seals_without_waiting() {
        let ledger = ledger().await;
        let scheduler = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_secs(3600), 2),
            CancellationToken::new(),
        )
        .unwrap();

        ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
        ledger.submit_certificate(CertificateSubmission::new("C2", "h2")).await.unwrap();

        wait_for_chain_len(&ledger, 2).await;
        assert!(ledger.verify_by_hash("h2").await.verified);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_leaves_pending_in_pool() {
        let ledger = ledger().await;
        let scheduler = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_secs(3600), 50),
            CancellationToken::new(),
        )
        .unwrap();

        ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), scheduler.shutdown())
            .await
            .unwrap();

        assert_eq!(ledger.chain_len().await, 1);
        assert_eq!(ledger.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_seal() {
        let ledger = ledger_at(4).await;
        let cancel = CancellationToken::new();
        let scheduler = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_secs(3600), 1),
            cancel.clone(),
        )
        .unwrap();

        ledger.submit_certificate(CertificateSubmission::new("C1", "h1")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(10), async {
            while !ledger.sealing_in_progress() && ledger.chain_len().await < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("seal never started");

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(30), scheduler.shutdown())
            .await
            .unwrap();

        assert!(!ledger.sealing_in_progress());
        assert_eq!(ledger.chain_len().await, 2);
        assert_eq!(ledger.pending_count().await, 0);
        assert!(ledger.verify_by_hash("h1").await.verified);
    }

    #[tokio::test]
    async fn test_second_scheduler_rejected() {
        let ledger = ledger().await;
        let first = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_millis(10), 1),
            CancellationToken::new(),
        )
        .unwrap();
        let second = SealScheduler::spawn(
            ledger.clone(),
            policy(Duration::from_millis(10), 1),
            CancellationToken::new(),
        );
        assert!(matches!(second, Err(LedgerError::Config(_))));
        first.shutdown().await;
    }
}
