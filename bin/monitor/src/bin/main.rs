use clap::Parser;
use client::RollupNodeClient;
use monitor::{
    config::Config,
    ensure_chain_id,
    metrics::{install_prometheus_exporter, Metrics},
    WithdrawalMonitor,
};
use std::time::Instant;
use tokio::time;
use tracing::{error, info};
use withdrawal::{MessagePasserReader, PortalReader};

#[derive(Parser)]
#[command(name = "monitor")]
#[command(about = "Watch proven withdrawals for forged fault-proof claims")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", env = "MONITOR_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting withdrawal monitor");

    let cli = Cli::parse();
    info!("Loading config: {}", cli.config);
    let config = Config::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", config.network);
    info!("  L1 RPC URL: {}", config.l1_rpc_url);
    info!("  L2 RPC URL: {}", config.l2_rpc_url);
    info!("  L1 Portal: {}", network.rollup.l1_portal);
    info!("  Lookback: {}s, batch size: {}", config.lookback_secs, config.batch_size);
    if config.ignore_certificate {
        info!("  TLS certificate verification disabled");
    }

    install_prometheus_exporter(config.metrics_port)?;
    let mut metrics = Metrics::new();
    info!(port = config.metrics_port, "Prometheus exporter listening");

    let l1_provider =
        client::create_provider_with_tls(&config.l1_rpc_url, config.ignore_certificate)?;
    let l2_provider =
        client::create_provider_with_tls(&config.l2_rpc_url, config.ignore_certificate)?;
    let rollup_node =
        RollupNodeClient::with_tls(&config.rollup_node_url, config.ignore_certificate)?;
    info!("  Rollup node: {}", rollup_node.url());

    ensure_chain_id(&l1_provider, network.settlement.chain_id, "L1").await?;
    ensure_chain_id(&l2_provider, network.rollup.chain_id, "L2").await?;
    info!(
        l1_chain_id = network.settlement.chain_id,
        l2_chain_id = network.rollup.chain_id,
        "Chain ids match network preset"
    );

    let mut monitor = WithdrawalMonitor::new(
        PortalReader::new(l1_provider, network.rollup.l1_portal),
        MessagePasserReader::new(l2_provider, network.rollup.message_passer),
        rollup_node,
    )
    .with_batch_size(config.batch_size)
    .with_lookback(config.lookback());
    if let Some(start_block) = config.start_block {
        info!(start_block, "Starting from configured block");
        monitor = monitor.with_start_block(start_block);
    }

    info!("Starting monitoring loop...");

    let mut interval = time::interval(config.poll_interval());

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }

        let started = Instant::now();
        match monitor.run_cycle().await {
            Ok(report) => {
                metrics.record_heads(&report);
                metrics.record_cycle(true, started.elapsed());
            }
            Err(e) => {
                error!(error = %e, "Monitor cycle failed");
                metrics.record_cycle(false, started.elapsed());
            }
        }
        metrics.record_state(monitor.state());
    }

    Ok(())
}
