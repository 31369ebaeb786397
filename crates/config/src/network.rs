//! Network configuration for withdrawal monitoring.
//!
//! Provides chain-specific addresses and parameters for different networks
//! (mainnet, testnet, etc.).

use alloy_primitives::{address, Address};
use binding::opstack::MESSAGE_PASSER_ADDRESS;
use serde::{Deserialize, Serialize};

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// Settlement chain (L1) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Chain ID
    pub chain_id: u64,
}

impl SettlementConfig {
    /// Ethereum mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
        }
    }

    /// Ethereum Sepolia testnet configuration.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
        }
    }
}

/// Rollup (L2) configuration, including its L1 bridge deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Chain ID
    pub chain_id: u64,
    /// OptimismPortal2 proxy on L1
    pub l1_portal: Address,
    /// L2ToL1MessagePasser (OP Stack predeploy)
    pub message_passer: Address,
}

impl RollupConfig {
    /// Unichain mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 130,
            // https://etherscan.io/address/0x0bd48f6B86a26D3a217d0Fa6FfE2B491B956A7a2
            l1_portal: address!("0x0bd48f6B86a26D3a217d0Fa6FfE2B491B956A7a2"),
            message_passer: MESSAGE_PASSER_ADDRESS,
        }
    }

    /// Unichain Sepolia testnet configuration.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 1301,
            // https://sepolia.etherscan.io/address/0x0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD
            l1_portal: address!("0x0d83dab629f0e0F9d36c0Cbc89B69a489f0751bD"),
            message_passer: MESSAGE_PASSER_ADDRESS,
        }
    }
}

/// Complete network configuration for withdrawal monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    /// Settlement chain configuration
    pub settlement: SettlementConfig,
    /// Rollup configuration
    pub rollup: RollupConfig,
}

impl NetworkConfig {
    /// Create mainnet configuration.
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            settlement: SettlementConfig::mainnet(),
            rollup: RollupConfig::mainnet(),
        }
    }

    /// Create testnet (Sepolia) configuration.
    pub const fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            settlement: SettlementConfig::sepolia(),
            rollup: RollupConfig::sepolia(),
        }
    }

    /// Create configuration from network type.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::sepolia(),
        }
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    network_type: NetworkType,
    settlement: SettlementConfig,
    rollup: RollupConfig,
}

impl NetworkConfigBuilder {
    /// Start with mainnet defaults.
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            settlement: SettlementConfig::mainnet(),
            rollup: RollupConfig::mainnet(),
        }
    }

    /// Start with testnet defaults.
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            settlement: SettlementConfig::sepolia(),
            rollup: RollupConfig::sepolia(),
        }
    }

    /// Start from the defaults of the given network type.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
        }
    }

    /// Override the L1 OptimismPortal2 address.
    pub const fn l1_portal(mut self, address: Address) -> Self {
        self.rollup.l1_portal = address;
        self
    }

    /// Build the network configuration.
    pub const fn build(self) -> NetworkConfig {
        NetworkConfig {
            network_type: self.network_type,
            settlement: self.settlement,
            rollup: self.rollup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_config() {
        let config = NetworkConfig::mainnet();
        assert_eq!(config.settlement.chain_id, 1);
        assert_eq!(config.rollup.chain_id, 130);
        assert_eq!(config.network_type, NetworkType::Mainnet);
    }

    #[test]
    fn test_sepolia_config() {
        let config = NetworkConfig::sepolia();
        assert_eq!(config.settlement.chain_id, 11155111);
        assert_eq!(config.rollup.chain_id, 1301);
        assert_eq!(config.network_type, NetworkType::Testnet);
    }

    #[test]
    fn test_message_passer_is_predeploy() {
        let predeploy = address!("4200000000000000000000000000000000000016");
        assert_eq!(NetworkConfig::mainnet().rollup.message_passer, predeploy);
        assert_eq!(NetworkConfig::sepolia().rollup.message_passer, predeploy);
    }

    #[test]
    fn test_custom_config_builder() {
        let custom_portal = address!("1111111111111111111111111111111111111111");

        let config = NetworkConfigBuilder::from_network_type(NetworkType::Testnet)
            .l1_portal(custom_portal)
            .build();

        assert_eq!(config.rollup.l1_portal, custom_portal);
        assert_eq!(config.rollup.chain_id, 1301);
        assert_eq!(config.network_type, NetworkType::Testnet);
    }

    #[test]
    fn test_network_type_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            network: NetworkType,
        }

        let parsed: Wrapper = toml::from_str("network = \"testnet\"").unwrap();
        assert_eq!(parsed.network, NetworkType::Testnet);
    }
}
