//! Job requests, outputs and the per-job state machine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calldata::{CalldataResult, VaultCall};
use super::error::DomainError;
use super::failure::{FailureKind, JobFailure};
use super::id::{Fingerprint, JobId};
use super::money::{parse_address, parse_amount};
use super::risk::RiskSnapshot;

/// Closed set of job kinds. Adding a kind is a compile-time checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    LpDeposit,
    LpWithdraw,
    RiskSnapshot,
}

impl JobKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LpDeposit => "lp_deposit",
            Self::LpWithdraw => "lp_withdraw",
            Self::RiskSnapshot => "risk_snapshot",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deposit `assets` (token base units) into the vault for `receiver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub assets: String,
    pub receiver: String,
}

/// Withdraw `assets` from `owner`'s vault position to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub assets: String,
    pub receiver: String,
    pub owner: String,
}

/// Compute a risk snapshot for a trader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRequest {
    #[serde(alias = "trader")]
    pub trader_address: String,
}

/// Kind-specific job input, exactly as received from the API layer.
///
/// Serialized as `{"kind": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum JobPayload {
    LpDeposit(DepositRequest),
    LpWithdraw(WithdrawRequest),
    RiskSnapshot(RiskRequest),
}

impl JobPayload {
    #[must_use]
    pub fn kind(&self) -> JobKind {
        match self {
            Self::LpDeposit(_) => JobKind::LpDeposit,
            Self::LpWithdraw(_) => JobKind::LpWithdraw,
            Self::RiskSnapshot(_) => JobKind::RiskSnapshot,
        }
    }

    /// Normalized fields with stable key ordering.
    ///
    /// Parseable amounts become plain decimal strings and parseable addresses
    /// become checksummed, so `"0x0f4240"` and `"1000000"` collide. Fields
    /// that do not parse are kept trimmed; the processor rejects them later.
    #[must_use]
    pub fn canonical_fields(&self) -> BTreeMap<&'static str, String> {
        let mut fields = BTreeMap::new();
        match self {
            Self::LpDeposit(r) => {
                fields.insert("assets", canonical_amount(&r.assets));
                fields.insert("receiver", canonical_address(&r.receiver));
            }
            Self::LpWithdraw(r) => {
                fields.insert("assets", canonical_amount(&r.assets));
                fields.insert("receiver", canonical_address(&r.receiver));
                fields.insert("owner", canonical_address(&r.owner));
            }
            Self::RiskSnapshot(r) => {
                fields.insert("traderAddress", canonical_address(&r.trader_address));
            }
        }
        fields
    }

    /// Parse and validate into a vault call. `None` for non-calldata kinds.
    pub fn vault_call(&self) -> Option<Result<VaultCall, DomainError>> {
        match self {
            Self::LpDeposit(r) => Some(r.to_call()),
            Self::LpWithdraw(r) => Some(r.to_call()),
            Self::RiskSnapshot(_) => None,
        }
    }
}

fn canonical_amount(raw: &str) -> String {
    parse_amount(raw).map_or_else(|_| raw.trim().to_string(), |v| v.to_string())
}

fn canonical_address(raw: &str) -> String {
    parse_address(raw).map_or_else(|_| raw.trim().to_lowercase(), |a| a.to_checksum(None))
}

fn positive_amount(raw: &str) -> Result<alloy_primitives::U256, DomainError> {
    let amount = parse_amount(raw)?;
    if amount.is_zero() {
        return Err(DomainError::ZeroAmount);
    }
    Ok(amount)
}

fn non_zero_address(raw: &str, field: &'static str) -> Result<Address, DomainError> {
    let address = parse_address(raw)?;
    if address == Address::ZERO {
        return Err(DomainError::ZeroAddress { field });
    }
    Ok(address)
}

impl DepositRequest {
    pub fn to_call(&self) -> Result<VaultCall, DomainError> {
        Ok(VaultCall::Deposit {
            assets: positive_amount(&self.assets)?,
            receiver: non_zero_address(&self.receiver, "receiver")?,
        })
    }
}

impl WithdrawRequest {
    pub fn to_call(&self) -> Result<VaultCall, DomainError> {
        Ok(VaultCall::Withdraw {
            assets: positive_amount(&self.assets)?,
            receiver: non_zero_address(&self.receiver, "receiver")?,
            owner: non_zero_address(&self.owner, "owner")?,
        })
    }
}

impl RiskRequest {
    pub fn trader(&self) -> Result<Address, DomainError> {
        non_zero_address(&self.trader_address, "traderAddress")
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum JobOutput {
    Calldata(CalldataResult),
    Risk(RiskSnapshot),
}

impl JobOutput {
    #[must_use]
    pub fn as_calldata(&self) -> Option<&CalldataResult> {
        match self {
            Self::Calldata(c) => Some(c),
            Self::Risk(_) => None,
        }
    }

    #[must_use]
    pub fn as_risk(&self) -> Option<&RiskSnapshot> {
        match self {
            Self::Risk(r) => Some(r),
            Self::Calldata(_) => None,
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Attempted a transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Shared cancellation request flag checked by processors at safe points.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Immutable description of requested work plus its mutable status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    id: JobId,
    fingerprint: Fingerprint,
    #[serde(flatten)]
    payload: JobPayload,
    status: JobStatus,
    attempts: u32,
    max_attempts: u32,
    #[serde(skip)]
    timeout: Duration,
    result: Option<JobOutput>,
    error_info: Option<JobFailure>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    cancel: CancelFlag,
}

impl JobRecord {
    /// A fresh `Pending` record.
    #[must_use]
    pub fn new(
        fingerprint: Fingerprint,
        payload: JobPayload,
        max_attempts: u32,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new(),
            fingerprint,
            payload,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts,
            timeout,
            result: None,
            error_info: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
            cancel: CancelFlag::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    #[must_use]
    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn result(&self) -> Option<&JobOutput> {
        self.result.as_ref()
    }

    /// Failure info; on a `Pending` retry this is the last attempt's failure.
    #[must_use]
    pub fn error_info(&self) -> Option<&JobFailure> {
        self.error_info.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn transition(
        &mut self,
        allowed: &[JobStatus],
        to: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        if !allowed.contains(&self.status) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        if to.is_terminal() {
            self.finished_at = Some(now);
        }
        Ok(())
    }

    /// `Pending -> Active`, counting the attempt.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> Result<u32, InvalidTransition> {
        self.transition(&[JobStatus::Pending], JobStatus::Active, now)?;
        self.attempts += 1;
        Ok(self.attempts)
    }

    /// `Active -> Completed`.
    pub fn complete(
        &mut self,
        output: JobOutput,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.transition(&[JobStatus::Active], JobStatus::Completed, now)?;
        self.result = Some(output);
        self.error_info = None;
        Ok(())
    }

    /// `Active -> Pending` after a retryable failure.
    pub fn requeue(
        &mut self,
        failure: JobFailure,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.transition(&[JobStatus::Active], JobStatus::Pending, now)?;
        self.error_info = Some(failure);
        Ok(())
    }

    /// `Active -> Failed`.
    pub fn fail(
        &mut self,
        failure: JobFailure,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.transition(&[JobStatus::Active], JobStatus::Failed, now)?;
        self.error_info = Some(failure);
        Ok(())
    }

    /// `Pending | Active -> Cancelled`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.transition(&[JobStatus::Pending, JobStatus::Active], JobStatus::Cancelled, now)?;
        self.cancel.request();
        Ok(())
    }
}

/// One lifecycle transition as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub job_id: JobId,
    pub fingerprint: Fingerprint,
    pub kind: JobKind,
    pub status: JobStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<JobFailure>,
    pub at: DateTime<Utc>,
}

impl StatusChange {
    /// Snapshot of a record's current state.
    #[must_use]
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            job_id: record.id,
            fingerprint: record.fingerprint,
            kind: record.kind(),
            status: record.status,
            attempts: record.attempts,
            result: record.result.clone(),
            error_info: record.error_info.clone(),
            at: record.updated_at,
        }
    }

    /// Terminal outcome carried by this change, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self.status {
            JobStatus::Completed => self.result.clone().map(JobOutcome::Completed),
            JobStatus::Failed => {
                let failure = self.error_info.clone().unwrap_or_else(|| {
                    JobFailure::new(FailureKind::Permanent, "unknown failure", self.attempts)
                });
                Some(JobOutcome::Failed(failure))
            }
            JobStatus::Cancelled => Some(JobOutcome::Cancelled),
            JobStatus::Pending | JobStatus::Active => None,
        }
    }
}

/// What a caller ultimately receives for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed(JobOutput),
    Failed(JobFailure),
    Cancelled,
    /// The notification stream ended before a terminal state was observed.
    Closed,
}

impl JobOutcome {
    #[must_use]
    pub fn output(&self) -> Option<&JobOutput> {
        match self {
            Self::Completed(output) => Some(output),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::failure::FailureKind;
    use alloy_primitives::B256;

    fn deposit(assets: &str, receiver: &str) -> JobPayload {
        JobPayload::LpDeposit(DepositRequest {
            assets: assets.into(),
            receiver: receiver.into(),
        })
    }

    fn record() -> JobRecord {
        JobRecord::new(
            Fingerprint::from_digest(B256::ZERO),
            deposit("1", "0x52908400098527886e0f7030069857d2e4169ee7"),
            3,
            Duration::from_secs(5),
            Utc::now(),
        )
    }

    #[test]
    fn payload_uses_kind_and_payload_envelope() {
        let json = serde_json::json!({
            "kind": "lp_withdraw",
            "payload": {"assets": "10", "receiver": "0xa", "owner": "0xb"}
        });
        let payload: JobPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.kind(), JobKind::LpWithdraw);
    }

    #[test]
    fn risk_payload_accepts_trader_address() {
        let json = serde_json::json!({
            "kind": "risk_snapshot",
            "payload": {"traderAddress": "0x52908400098527886e0f7030069857d2e4169ee7"}
        });
        let payload: JobPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.kind(), JobKind::RiskSnapshot);
    }

    #[test]
    fn canonical_fields_normalize_amount_and_address() {
        let a = deposit("0x0f4240", "0x52908400098527886e0f7030069857d2e4169ee7");
        let b = deposit(" 1000000 ", "0x52908400098527886E0F7030069857D2E4169EE7");
        assert_eq!(a.canonical_fields(), b.canonical_fields());
        assert_eq!(a.canonical_fields()["assets"], "1000000");
    }

    #[test]
    fn canonical_fields_keep_unparseable_input() {
        let p = deposit("abc", "0xABC");
        let fields = p.canonical_fields();
        assert_eq!(fields["assets"], "abc");
        assert_eq!(fields["receiver"], "0xabc");
    }

    #[test]
    fn vault_call_rejects_zero_amount_and_zero_address() {
        let zero_amount = deposit("0", "0x52908400098527886e0f7030069857d2e4169ee7");
        assert_eq!(
            zero_amount.vault_call().unwrap().unwrap_err(),
            DomainError::ZeroAmount
        );

        let zero_receiver = deposit("1", "0x0000000000000000000000000000000000000000");
        assert_eq!(
            zero_receiver.vault_call().unwrap().unwrap_err(),
            DomainError::ZeroAddress { field: "receiver" }
        );
    }

    #[test]
    fn happy_path_transitions() {
        let mut job = record();
        assert_eq!(job.begin_attempt(Utc::now()).unwrap(), 1);
        job.requeue(
            JobFailure::new(FailureKind::Transient, "rpc down", 1),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.error_info().is_some());

        assert_eq!(job.begin_attempt(Utc::now()).unwrap(), 2);
        let output = JobOutput::Calldata(
            CalldataResult::build(
                Address::ZERO,
                6,
                job.payload().vault_call().unwrap().unwrap(),
            )
            .unwrap(),
        );
        job.complete(output, Utc::now()).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.finished_at().is_some());
        assert!(job.error_info().is_none());
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut job = record();
        job.cancel(Utc::now()).unwrap();
        assert!(job.cancel_flag().is_requested());
        assert_eq!(
            job.begin_attempt(Utc::now()).unwrap_err(),
            InvalidTransition {
                from: JobStatus::Cancelled,
                to: JobStatus::Active
            }
        );
    }

    #[test]
    fn status_change_reports_terminal_outcome() {
        let mut job = record();
        job.begin_attempt(Utc::now()).unwrap();
        assert!(StatusChange::from_record(&job).outcome().is_none());

        job.fail(JobFailure::new(FailureKind::Permanent, "bad", 1), Utc::now())
            .unwrap();
        let change = StatusChange::from_record(&job);
        assert_eq!(change.status, JobStatus::Failed);
        assert_eq!(change.outcome().unwrap().failure().unwrap().message, "bad");
    }

    #[test]
    fn cannot_complete_pending_job() {
        let mut job = record();
        let failure = JobFailure::new(FailureKind::Permanent, "x", 0);
        assert!(job.fail(failure, Utc::now()).is_err());
    }
}
