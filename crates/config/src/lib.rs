//! Configuration types for the withdrawal monitor.
//!
//! This crate provides:
//! - Network configurations (mainnet, testnet)
//! - Contract addresses for the settlement chain and the rollup
//! - Builder overrides for custom deployments

pub mod network;

pub use network::{
    NetworkConfig, NetworkConfigBuilder, NetworkType, RollupConfig, SettlementConfig,
};
