use alloy_primitives::Address;
use ::config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use withdrawal::{DEFAULT_BATCH_SIZE, ONE_WEEK};

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// L1 (settlement chain) RPC endpoint url
    pub l1_rpc_url: String,

    /// L2 (rollup) RPC endpoint url
    pub l2_rpc_url: String,

    /// Rollup node (op-node) RPC endpoint url
    pub rollup_node_url: String,

    /// Network preset for contract addresses
    pub network: NetworkType,

    /// Overrides the preset OptimismPortal2 address
    #[serde(default)]
    pub l1_portal_address: Option<Address>,

    /// Skip TLS certificate verification on all endpoints
    #[serde(default)]
    pub ignore_certificate: bool,

    /// Log query window in blocks
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// How far back the scan reaches, in seconds
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,

    /// Seconds between cycles, must be positive
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// First settlement block to scan; the lookback floor when unset
    #[serde(default)]
    pub start_block: Option<u64>,

    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

const fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

const fn default_lookback_secs() -> u64 {
    ONE_WEEK.as_secs()
}

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.poll_interval_secs == 0 {
            eyre::bail!("poll_interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// Network preset with the configured overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let builder = NetworkConfigBuilder::from_network_type(self.network);
        match self.l1_portal_address {
            Some(portal) => builder.l1_portal(portal).build(),
            None => builder.build(),
        }
    }

    pub const fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
