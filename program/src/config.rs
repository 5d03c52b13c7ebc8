// Per-cluster deployment presets
use solana_program::pubkey::Pubkey;

use crate::{
    state::{RaffleConfig, REQUEST_CONFIRMATIONS},
    utils::milli_sol,
};

/// Flat fee the mock coordinator charges per fulfillment, 0.25 LINK
pub const BASE_FEE: u64 = 250_000_000_000_000_000;

/// Mock coordinator fee per unit of callback gas
pub const GAS_PRICE_LINK: u64 = 1_000_000_000;

/// Amount a freshly created development subscription is funded with, 2 LINK
pub const VRF_SUB_FUND_AMOUNT: u64 = 2_000_000_000_000_000_000;

/// Clusters where the mock coordinator is deployed alongside the raffle
pub const DEVELOPMENT_CLUSTERS: &[&str] = &["localnet", "test-validator"];

const GAS_LANE: [u8; 32] = [
    71, 78, 52, 160, 119, 223, 88, 128, 125, 190, 156, 150, 211, 192, 9, 178, 59, 60, 109, 12,
    206, 67, 62, 89, 187, 245, 179, 79, 130, 59, 197, 108,
];

/// Raffle constructor arguments for one cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub entrance_fee: u64,
    pub gas_lane: [u8; 32],
    /// Unset where the subscription is created at deploy time
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: u32,
    pub interval: u64,
    /// Unset where the mock coordinator is deployed at deploy time
    pub coordinator: Option<Pubkey>,
}

impl NetworkConfig {
    pub fn for_cluster(cluster: &str) -> Option<NetworkConfig> {
        match cluster {
            "devnet" => Some(NetworkConfig {
                name: "Devnet",
                entrance_fee: milli_sol(100),
                gas_lane: GAS_LANE,
                subscription_id: Some(1),
                callback_gas_limit: 500_000,
                interval: 30,
                coordinator: None,
            }),
            "localnet" | "test-validator" => Some(NetworkConfig {
                name: "Localnet",
                entrance_fee: milli_sol(100),
                gas_lane: GAS_LANE,
                subscription_id: None,
                callback_gas_limit: 500_000,
                interval: 30,
                coordinator: None,
            }),
            _ => None,
        }
    }

    pub fn is_development(cluster: &str) -> bool {
        DEVELOPMENT_CLUSTERS.contains(&cluster)
    }
}

impl RaffleConfig {
    /// Builds the raffle configuration for `network`. Values fixed by the preset
    /// take precedence over `coordinator` and `subscription_id`, which supply the
    /// accounts a development deployment creates itself.
    pub fn from_network(network: &NetworkConfig, coordinator: Pubkey, subscription_id: u64) -> Self {
        RaffleConfig {
            coordinator: network.coordinator.unwrap_or(coordinator),
            entrance_fee: network.entrance_fee,
            gas_lane: network.gas_lane,
            subscription_id: network.subscription_id.unwrap_or(subscription_id),
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: network.callback_gas_limit,
            interval: network.interval,
        }
    }
}
