#![forbid(unsafe_code)]
//! Operator CLI for the certificate ledger

use certledger::blockchain::TransactionRecord;
use certledger::cli::{init_logging, open_ledger, resolve_config};
use certledger::crypto::{certificate_hash, CertificateFields};
use certledger::transaction::{CertificateSubmission, TransactionStatus};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Certificate ledger operator tool", long_about = None)]
struct Cli {
    /// Path to certledger.toml (defaults to $CERTLEDGER_CONFIG or ./certledger.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anchors a certificate hash (pending until the next seal)
    Store {
        certificate_id: String,
        certificate_hash: String,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        learner: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Seal immediately instead of leaving the transaction pending
        #[arg(long)]
        seal: bool,
    },
    /// Checks whether a certificate hash is anchored in a sealed block
    Verify { certificate_hash: String },
    /// Shows a transaction by id
    Tx { transaction_id: String },
    /// Lists anchors for a certificate id or learner
    Search {
        #[arg(long, conflicts_with = "learner", required_unless_present = "learner")]
        certificate_id: Option<String>,
        #[arg(long)]
        learner: Option<String>,
    },
    /// Shows a block by number
    Block { number: u64 },
    /// Lists the most recent confirmed transactions
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Ledger statistics
    Stats,
    /// Recomputes every block hash and link
    Validate,
    /// Seals all pending transactions now
    Seal,
    /// Derives the canonical certificate hash from its fields
    Hash {
        #[arg(long)]
        certificate_id: String,
        #[arg(long)]
        learner: String,
        #[arg(long)]
        issuer: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        issue_date: String,
        #[arg(long)]
        verification_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    if let Commands::Hash {
        certificate_id,
        learner,
        issuer,
        title,
        issue_date,
        verification_type,
    } = cli.command
    {
        let fields = CertificateFields {
            certificate_id,
            learner_id: learner,
            issuer,
            title,
            issue_date,
            verification_type,
        };
        println!("{}", certificate_hash(&fields));
        return Ok(());
    }

    let ledger = open_ledger(&config).await?;
    let reward_recipient = config.sealing.reward_recipient.as_deref();

    match cli.command {
        Commands::Store {
            certificate_id,
            certificate_hash,
            issuer,
            learner,
            title,
            seal,
        } => {
            let mut submission = CertificateSubmission::new(certificate_id, certificate_hash);
            submission.issuer = issuer;
            submission.learner_id = learner;
            submission.title = title;

            let receipt = ledger.store_certificate(submission).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                println!("{} {}", "✅ Stored".bright_green().bold(), receipt.transaction_id);
                println!("   {}", receipt.message.dimmed());
            }

            if seal {
                if let Some(block) = ledger.seal_pending(reward_recipient).await? {
                    println!(
                        "{} block #{} {}",
                        "⛏️  Sealed".bright_yellow().bold(),
                        block.index,
                        block.hash.bright_cyan()
                    );
                }
            }
        }
        Commands::Verify { certificate_hash } => {
            let result = ledger.verify_by_hash(&certificate_hash).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.verified {
                println!("{}", "✅ Certificate anchored".bright_green().bold());
                println!("   Block:         #{}", result.block_number.unwrap_or_default());
                println!("   Block hash:    {}", result.block_hash.unwrap_or_default().cyan());
                println!("   Transaction:   {}", result.transaction_id.unwrap_or_default());
                println!("   Submitted:     {}", format_millis(result.timestamp.unwrap_or_default()));
                println!("   Confirmations: {}", result.confirmations.unwrap_or_default());
            } else {
                println!(
                    "{} {}",
                    "❌".red(),
                    result.message.unwrap_or_default().red().bold()
                );
            }
        }
        Commands::Tx { transaction_id } => match ledger.get_transaction(&transaction_id).await {
            Some(record) if cli.json => println!("{}", serde_json::to_string_pretty(&record)?),
            Some(record) => println!("{}", records_table(&[record])),
            None => {
                eprintln!("{}", format!("Transaction {} not found", transaction_id).red());
                std::process::exit(1);
            }
        },
        Commands::Search {
            certificate_id,
            learner,
        } => {
            let records = match (certificate_id, learner) {
                (Some(id), _) => ledger.search_by_certificate_id(&id).await,
                (None, Some(learner)) => ledger.search_by_learner(&learner).await,
                (None, None) => Vec::new(),
            };
            print_records(&records, cli.json)?;
        }
        Commands::Block { number } => match ledger.get_block(number).await {
            Some(block) if cli.json => println!("{}", serde_json::to_string_pretty(&block)?),
            Some(block) => {
                let summary = block.summary();
                println!("{}", format!("📦 Block #{}", summary.index).bright_cyan().bold());
                println!("   Hash:          {}", summary.hash);
                println!("   Previous hash: {}", summary.previous_hash);
                println!("   Sealed:        {}", format_millis(summary.timestamp));
                println!("   Nonce:         {}", summary.nonce);
                println!("   Difficulty:    {}", summary.difficulty);
                println!("   Transactions:  {}", summary.transaction_count);
            }
            None => {
                eprintln!("{}", format!("Block {} not found", number).red());
                std::process::exit(1);
            }
        },
        Commands::Recent { limit } => {
            let records = ledger.recent_transactions(limit).await;
            print_records(&records, cli.json)?;
        }
        Commands::Stats => {
            let stats = ledger.get_stats().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec![
                        Cell::new("Metric").add_attribute(Attribute::Bold),
                        Cell::new("Value").add_attribute(Attribute::Bold),
                    ]);
                table.add_row(vec!["Blocks".to_string(), stats.total_blocks.to_string()]);
                table.add_row(vec!["Transactions".to_string(), stats.total_transactions.to_string()]);
                table.add_row(vec!["Anchors".to_string(), stats.anchor_transactions.to_string()]);
                table.add_row(vec!["Pending".to_string(), stats.pending_transactions.to_string()]);
                table.add_row(vec!["Difficulty".to_string(), stats.difficulty.to_string()]);
                table.add_row(vec!["Issuers".to_string(), stats.unique_issuers.to_string()]);
                table.add_row(vec![
                    "Latest block".to_string(),
                    format!("#{} {}", stats.latest_block.index, stats.latest_block.hash),
                ]);
                if let Some(at) = stats.last_transaction_time {
                    table.add_row(vec!["Last transaction".to_string(), format_millis(at)]);
                }
                for (issuer, count) in &stats.issuer_breakdown {
                    table.add_row(vec![format!("  {}", issuer), count.to_string()]);
                }
                println!("{table}");
            }
        }
        Commands::Validate => {
            let validation = ledger.validate_chain().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&validation)?);
            } else if validation.valid {
                println!("{}", "✅ Chain is valid".bright_green().bold());
            } else {
                println!(
                    "{} {}",
                    "❌ Chain is invalid:".red().bold(),
                    validation.error.unwrap_or_default()
                );
                std::process::exit(2);
            }
        }
        Commands::Seal => match ledger.seal_pending(reward_recipient).await? {
            Some(block) if cli.json => println!("{}", serde_json::to_string_pretty(&block)?),
            Some(block) => println!(
                "{} block #{} with {} transactions (nonce {}) {}",
                "⛏️  Sealed".bright_yellow().bold(),
                block.index,
                block.transactions.len(),
                block.nonce,
                block.hash.bright_cyan()
            ),
            None => println!("{}", "Nothing to seal: the pool is empty".yellow()),
        },
        Commands::Hash { .. } => {}
    }

    Ok(())
}

fn print_records(records: &[TransactionRecord], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else if records.is_empty() {
        println!("{}", "No matching transactions".yellow());
    } else {
        println!("{}", records_table(records));
    }
    Ok(())
}

fn records_table(records: &[TransactionRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Transaction").add_attribute(Attribute::Bold),
            Cell::new("Type").add_attribute(Attribute::Bold),
            Cell::new("Certificate").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Block").add_attribute(Attribute::Bold),
            Cell::new("Conf.").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
        ]);

    for record in records {
        let tx = &record.transaction;
        let (status, color) = match tx.status {
            TransactionStatus::Confirmed => ("confirmed", TableColor::Green),
            TransactionStatus::Pending => ("pending", TableColor::Yellow),
        };
        table.add_row(vec![
            Cell::new(short(&tx.transaction_id)),
            Cell::new(tx.kind.to_string()),
            Cell::new(tx.certificate_id.as_deref().unwrap_or("-")),
            Cell::new(status).fg(color),
            Cell::new(
                tx.block_number
                    .map(|n| format!("#{}", n))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(record.confirmations),
            Cell::new(format_millis(tx.timestamp)),
        ]);
    }
    table
}

fn short(id: &str) -> String {
    if id.len() > 16 {
        format!("{}...", &id[..13])
    } else {
        id.to_string()
    }
}

fn format_millis(millis: u64) -> String {
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}
