//! Exchange-agnostic domain logic: jobs, legs, risk and vault calldata.

pub mod calldata;
pub mod error;
pub mod failure;
pub mod fingerprint;
pub mod id;
pub mod job;
pub mod leg;
pub mod money;
pub mod risk;

pub use calldata::{CalldataResult, VaultCall};
pub use error::DomainError;
pub use failure::{FailureClass, FailureKind, JobFailure};
pub use fingerprint::fingerprint;
pub use id::{Fingerprint, JobId, LegId, SeriesId};
pub use job::{
    CancelFlag, DepositRequest, JobKind, JobOutcome, JobOutput, JobPayload, JobRecord,
    JobStatus, RiskRequest, StatusChange, WithdrawRequest,
};
pub use leg::{OptionType, Position, PositionSet, Side, StrategyLeg};
pub use money::Price;
pub use risk::{Greeks, LegPricing, RiskSnapshot, UnderlyingMargin};
