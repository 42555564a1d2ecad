#![forbid(unsafe_code)]
//! Long-running ledger node: opens the configured ledger, runs the
//! auto-seal scheduler and shuts down cleanly on Ctrl-C.

use certledger::cli::{init_logging, open_ledger, resolve_config};
use certledger::scheduler::{SealPolicy, SealScheduler};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about = "Certificate ledger node", long_about = None)]
struct Args {
    /// Path to certledger.toml (defaults to $CERTLEDGER_CONFIG or ./certledger.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref())?;
    init_logging(&config.logging.level);

    let ledger = open_ledger(&config).await?;

    let validation = ledger.validate_chain().await;
    if !validation.valid {
        error!(
            "Chain failed validation at startup: {}",
            validation.error.unwrap_or_default()
        );
        return Err("ledger integrity check failed".into());
    }

    let cancel = CancellationToken::new();
    let scheduler = if config.sealing.enabled {
        Some(SealScheduler::spawn(
            ledger.clone(),
            SealPolicy::from(&config.sealing),
            cancel.clone(),
        )?)
    } else {
        warn!("auto-sealing disabled; pending certificates wait for a manual seal");
        None
    };

    // Anything restored from disk still needs sealing.
    let pending = ledger.pending_count().await;
    if pending > 0 && config.sealing.enabled {
        info!(pending, "sealing transactions restored from snapshot");
        if let Err(e) = ledger
            .seal_pending(config.sealing.reward_recipient.as_deref())
            .await
        {
            error!("Initial seal failed: {}", e);
        }
    }

    let stats = ledger.get_stats().await?;
    info!(
        blocks = stats.total_blocks,
        pending = stats.pending_transactions,
        difficulty = stats.difficulty,
        "certledger node running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    cancel.cancel();
    if ledger.sealing_in_progress() {
        info!("waiting for the running seal to finish");
    }
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    let stats = ledger.get_stats().await?;
    info!(
        blocks = stats.total_blocks,
        pending = stats.pending_transactions,
        "certledger node stopped"
    );
    Ok(())
}
