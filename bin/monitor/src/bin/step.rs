//! CLI tool to run individual monitor steps against live endpoints.
//!
//! Each subcommand runs one read-only operation and prints the result as JSON:
//! - `latest-event`: most recent proven withdrawal within the lookback window
//! - `block-at`: block produced at or before a unix timestamp
//! - `week-ago`: block produced one week ago
//! - `game-data`: dispute game and reconciliation data for a proven withdrawal
//! - `receipt-events`: proven-withdrawal events of one L1 transaction
//! - `output-root`: rollup node output root for an L2 block

use alloy_primitives::{Address, TxHash, B256};
use clap::{Parser, Subcommand};
use client::RollupNodeClient;
use monitor::config::Config;
use serde::Serialize;
use tracing::{error, info};
use withdrawal::{
    BlockTimeLocator, BlockTimestamp, LogScanner, MessagePasserReader, PortalReader, Verdict,
    WithdrawalEvent, WithdrawalGameAggregator, WithdrawalHash,
};

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual monitor steps for testing")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", env = "MONITOR_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find the latest proven withdrawal within the lookback window
    LatestEvent,

    /// Find the block produced at or before a unix timestamp
    BlockAt { timestamp: u64 },

    /// Find the block produced one week ago
    WeekAgo,

    /// Aggregate dispute game data for a proven withdrawal
    GameData {
        /// Withdrawal hash, hex with or without 0x
        hash: String,
        /// Address that submitted the proof
        submitter: Address,
    },

    /// Decode proven-withdrawal events from a transaction receipt
    ReceiptEvents { tx_hash: TxHash },

    /// Query the rollup node output root at an L2 block
    OutputRoot { l2_block: u64 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventOutput {
    block_number: u64,
    withdrawal_hash: WithdrawalHash,
    proof_submitter: Address,
    transaction_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_timestamp: Option<BlockTimestamp>,
}

impl EventOutput {
    fn new(event: &WithdrawalEvent, block_timestamp: Option<BlockTimestamp>) -> Self {
        Self {
            block_number: event.block_number,
            withdrawal_hash: event.withdrawal_hash,
            proof_submitter: event.proof_submitter,
            transaction_hash: event.tx_hash(),
            block_timestamp,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputRootOutput {
    l2_block_number: u64,
    output_root: B256,
}

fn print_json(value: &impl Serialize) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  L1 Portal: {}", network.rollup.l1_portal);

    let tls_skip = config.ignore_certificate;

    match cli.command {
        Command::LatestEvent => {
            info!("Running: latest-event");

            let l1_provider = client::create_provider_with_tls(&config.l1_rpc_url, tls_skip)?;
            let portal = PortalReader::new(l1_provider, network.rollup.l1_portal);

            let floor = BlockTimeLocator::new(portal.clone())
                .find_block_before(config.lookback())
                .await?;
            let latest = LogScanner::new(portal)
                .find_latest_event(floor, config.batch_size)
                .await?;

            match latest {
                Some(latest) => {
                    print_json(&EventOutput::new(&latest.event, Some(latest.timestamp)))?;
                }
                None => {
                    info!(floor, "No proven withdrawal found");
                    print_json(&serde_json::Value::Null)?;
                }
            }
        }
        Command::BlockAt { timestamp } => {
            info!("Running: block-at");

            let l1_provider = client::create_provider_with_tls(&config.l1_rpc_url, tls_skip)?;
            let locator =
                BlockTimeLocator::new(PortalReader::new(l1_provider, network.rollup.l1_portal));

            let block = locator.find_block_at_or_before(timestamp).await?;
            print_json(&locator.block_timestamp(block).await?)?;
        }
        Command::WeekAgo => {
            info!("Running: week-ago");

            let l1_provider = client::create_provider_with_tls(&config.l1_rpc_url, tls_skip)?;
            let locator =
                BlockTimeLocator::new(PortalReader::new(l1_provider, network.rollup.l1_portal));

            let block = locator.find_block_one_week_ago().await?;
            print_json(&locator.block_timestamp(block).await?)?;
        }
        Command::GameData { hash, submitter } => {
            info!("Running: game-data");

            let l1_provider = client::create_provider_with_tls(&config.l1_rpc_url, tls_skip)?;
            let l2_provider = client::create_provider_with_tls(&config.l2_rpc_url, tls_skip)?;
            let rollup_node = RollupNodeClient::with_tls(&config.rollup_node_url, tls_skip)?;

            let aggregator = WithdrawalGameAggregator::new(
                PortalReader::new(l1_provider, network.rollup.l1_portal),
                MessagePasserReader::new(l2_provider, network.rollup.message_passer),
                rollup_node,
            );

            let data = aggregator.get_game_data(hash, submitter).await?;
            let verdict = data.verdict();
            print_json(&data)?;

            match verdict {
                Verdict::Valid | Verdict::Unverified => {
                    info!(verdict = verdict.as_str(), "Reconciled")
                }
                _ => error!(verdict = verdict.as_str(), "Forged withdrawal proof detected"),
            }
        }
        Command::ReceiptEvents { tx_hash } => {
            info!("Running: receipt-events");

            let l1_provider = client::create_provider_with_tls(&config.l1_rpc_url, tls_skip)?;
            let scanner = LogScanner::new(PortalReader::new(l1_provider, network.rollup.l1_portal));

            let events = scanner.events_in_receipt(tx_hash).await?;
            let output: Vec<_> = events.iter().map(|e| EventOutput::new(e, None)).collect();
            print_json(&output)?;
        }
        Command::OutputRoot { l2_block } => {
            info!("Running: output-root");

            let rollup_node = RollupNodeClient::with_tls(&config.rollup_node_url, tls_skip)?;
            let output_root = rollup_node.output_at_block(l2_block).await?;

            print_json(&OutputRootOutput {
                l2_block_number: l2_block,
                output_root,
            })?;
        }
    }

    Ok(())
}
