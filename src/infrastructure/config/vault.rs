//! Vault configuration.

use alloy_primitives::Address;
use serde::Deserialize;

/// ERC-4626 vault targeted by deposit and withdraw calldata.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    pub address: Option<Address>,
    /// Decimals of the vault's underlying asset.
    #[serde(default = "default_asset_decimals")]
    pub asset_decimals: u8,
}

const fn default_asset_decimals() -> u8 {
    6
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: None,
            asset_decimals: default_asset_decimals(),
        }
    }
}
