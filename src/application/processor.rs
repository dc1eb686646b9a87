//! Kind-specific job processors.
//!
//! Dispatch is an exhaustive match over [`JobPayload`], so a new job kind
//! does not compile until it has a processor.

use alloy_primitives::Address;
use tracing::debug;

use super::risk::RiskEngine;
use crate::domain::{CalldataResult, CancelFlag, DomainError, JobOutput, JobPayload, VaultCall};
use crate::error::JobError;

/// Builds ERC-4626 calldata against one configured vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalldataEncoder {
    vault: Address,
    asset_decimals: u8,
}

impl CalldataEncoder {
    #[must_use]
    pub const fn new(vault: Address, asset_decimals: u8) -> Self {
        Self {
            vault,
            asset_decimals,
        }
    }

    #[must_use]
    pub const fn vault(&self) -> Address {
        self.vault
    }

    /// Validate and encode. Identical calls always produce identical bytes.
    pub fn encode(&self, call: Result<VaultCall, DomainError>) -> Result<CalldataResult, JobError> {
        let call = call?;
        let result = CalldataResult::build(self.vault, self.asset_decimals, call)?;
        debug!(
            function = result.call.function_name(),
            selector = %result.selector,
            "Calldata encoded"
        );
        Ok(result)
    }
}

/// Routes a payload to the processor for its kind.
pub struct Processors {
    calldata: CalldataEncoder,
    risk: RiskEngine,
}

impl Processors {
    #[must_use]
    pub fn new(calldata: CalldataEncoder, risk: RiskEngine) -> Self {
        Self { calldata, risk }
    }

    #[must_use]
    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    /// Run one attempt.
    ///
    /// Returns [`JobError::Cancelled`] when cancellation was requested before
    /// or during the attempt.
    pub async fn run(
        &self,
        payload: &JobPayload,
        cancel: &CancelFlag,
    ) -> Result<JobOutput, JobError> {
        if cancel.is_requested() {
            return Err(JobError::Cancelled);
        }
        match payload {
            JobPayload::LpDeposit(request) => self
                .calldata
                .encode(request.to_call())
                .map(JobOutput::Calldata),
            JobPayload::LpWithdraw(request) => self
                .calldata
                .encode(request.to_call())
                .map(JobOutput::Calldata),
            JobPayload::RiskSnapshot(request) => {
                let owner = request.trader()?;
                self.risk
                    .compute_snapshot(owner, cancel)
                    .await
                    .map(JobOutput::Risk)
            }
        }
    }
}
