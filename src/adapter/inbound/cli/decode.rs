//! `optivault decode`: recover vault call parameters from raw calldata.

use alloy_primitives::hex;

use super::command::DecodeArgs;
use super::output;
use crate::domain::{DomainError, VaultCall};
use crate::error::Result;

pub fn execute(args: &DecodeArgs) -> Result<bool> {
    let bytes = hex::decode(args.data.trim()).map_err(|e| DomainError::UndecodableCalldata {
        reason: e.to_string(),
    })?;
    let call = VaultCall::decode(&bytes)?;

    output::json_value("call", &call);
    if output::is_json() {
        return Ok(true);
    }

    output::section("Vault call");
    output::field("Function", call.function_name());
    output::field("Selector", call.selector());
    match &call {
        VaultCall::Deposit { assets, receiver } => {
            output::field("Assets", assets);
            output::field("Receiver", receiver);
        }
        VaultCall::Withdraw {
            assets,
            receiver,
            owner,
        } => {
            output::field("Assets", assets);
            output::field("Receiver", receiver);
            output::field("Owner", owner);
        }
    }
    Ok(true)
}
