//! ERC-4626 vault calldata for liquidity actions.
//!
//! Only encodes; signing and submission belong to the caller's wallet.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{sol, SolCall, SolInterface};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::money::from_units;

sol! {
    interface IERC4626 {
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner)
            external
            returns (uint256 shares);
    }
}

/// Structured parameters of a vault call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "camelCase")]
pub enum VaultCall {
    Deposit {
        assets: U256,
        receiver: Address,
    },
    Withdraw {
        assets: U256,
        receiver: Address,
        owner: Address,
    },
}

impl VaultCall {
    #[must_use]
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
        }
    }

    #[must_use]
    pub fn selector(&self) -> FixedBytes<4> {
        match self {
            Self::Deposit { .. } => FixedBytes(IERC4626::depositCall::SELECTOR),
            Self::Withdraw { .. } => FixedBytes(IERC4626::withdrawCall::SELECTOR),
        }
    }

    #[must_use]
    pub fn assets(&self) -> U256 {
        match self {
            Self::Deposit { assets, .. } | Self::Withdraw { assets, .. } => *assets,
        }
    }

    /// ABI-encode including the 4-byte selector.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let raw = match self {
            Self::Deposit { assets, receiver } => IERC4626::depositCall {
                assets: *assets,
                receiver: *receiver,
            }
            .abi_encode(),
            Self::Withdraw {
                assets,
                receiver,
                owner,
            } => IERC4626::withdrawCall {
                assets: *assets,
                receiver: *receiver,
                owner: *owner,
            }
            .abi_encode(),
        };
        Bytes::from(raw)
    }

    /// Recover the structured parameters from encoded calldata.
    pub fn decode(data: &[u8]) -> Result<Self, DomainError> {
        let call = IERC4626::IERC4626Calls::abi_decode(data).map_err(|e| {
            DomainError::UndecodableCalldata {
                reason: e.to_string(),
            }
        })?;
        Ok(match call {
            IERC4626::IERC4626Calls::deposit(c) => Self::Deposit {
                assets: c.assets,
                receiver: c.receiver,
            },
            IERC4626::IERC4626Calls::withdraw(c) => Self::Withdraw {
                assets: c.assets,
                receiver: c.receiver,
                owner: c.owner,
            },
        })
    }
}

/// Encoded calldata plus the parameters that produced it, ready for a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalldataResult {
    /// Vault the transaction must be sent to.
    pub target: Address,
    pub selector: FixedBytes<4>,
    pub data: Bytes,
    pub call: VaultCall,
    /// `assets` in display units of the vault's underlying token.
    pub assets_display: Decimal,
}

impl CalldataResult {
    /// Encode `call` against `target`.
    pub fn build(
        target: Address,
        asset_decimals: u8,
        call: VaultCall,
    ) -> Result<Self, DomainError> {
        let assets_display = from_units(call.assets(), asset_decimals)?;
        Ok(Self {
            target,
            selector: call.selector(),
            data: call.encode(),
            call,
            assets_display,
        })
    }

    /// Decode this result's bytes back into parameters.
    pub fn decode(&self) -> Result<VaultCall, DomainError> {
        VaultCall::decode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rust_decimal_macros::dec;

    const RECEIVER: Address = address!("52908400098527886e0f7030069857d2e4169ee7");
    const OWNER: Address = address!("8617e340b3d01fa5f11f306f4090fd50e238070d");
    const VAULT: Address = address!("de709f2102306220921060314715629080e2fb77");

    #[test]
    fn deposit_encoding_uses_erc4626_selector() {
        let call = VaultCall::Deposit {
            assets: U256::from(1_000_000u64),
            receiver: RECEIVER,
        };
        let encoded = call.encode();
        // keccak256("deposit(uint256,address)")[..4]
        assert_eq!(&encoded[..4], &[0x6e, 0x55, 0x3f, 0x65]);
        assert_eq!(encoded.len(), 4 + 32 * 2);
    }

    #[test]
    fn withdraw_encoding_uses_erc4626_selector() {
        let call = VaultCall::Withdraw {
            assets: U256::from(5u64),
            receiver: RECEIVER,
            owner: OWNER,
        };
        let encoded = call.encode();
        // keccak256("withdraw(uint256,address,address)")[..4]
        assert_eq!(&encoded[..4], &[0xb4, 0x60, 0xaf, 0x94]);
        assert_eq!(encoded.len(), 4 + 32 * 3);
    }

    #[test]
    fn decode_recovers_parameters() {
        let call = VaultCall::Withdraw {
            assets: U256::from(42u64),
            receiver: RECEIVER,
            owner: OWNER,
        };
        assert_eq!(VaultCall::decode(&call.encode()).unwrap(), call);
    }

    #[test]
    fn decode_rejects_unknown_selector() {
        let err = VaultCall::decode(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, DomainError::UndecodableCalldata { .. }));
    }

    #[test]
    fn build_reports_display_amount() {
        let result = CalldataResult::build(
            VAULT,
            6,
            VaultCall::Deposit {
                assets: U256::from(2_500_000u64),
                receiver: RECEIVER,
            },
        )
        .unwrap();
        assert_eq!(result.assets_display, dec!(2.5));
        assert_eq!(result.target, VAULT);
        assert_eq!(result.selector, result.call.selector());
        assert_eq!(result.decode().unwrap(), result.call);
    }
}
