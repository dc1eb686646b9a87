//! Deterministic job fingerprints.
//!
//! `keccak256("<kind>\n<canonical json>")` where the canonical JSON object
//! has sorted keys and normalized values (see [`JobPayload::canonical_fields`]).

use alloy_primitives::keccak256;

use super::id::Fingerprint;
use super::job::JobPayload;

/// Canonical byte form hashed into the fingerprint.
#[must_use]
pub fn canonical_bytes(payload: &JobPayload) -> Vec<u8> {
    let fields = payload.canonical_fields();
    // BTreeMap keeps keys sorted regardless of serde_json feature flags.
    let body = serde_json::to_string(&fields).unwrap_or_default();
    let mut bytes = Vec::with_capacity(body.len() + 16);
    bytes.extend_from_slice(payload.kind().as_str().as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

/// Fingerprint of a job request.
#[must_use]
pub fn fingerprint(payload: &JobPayload) -> Fingerprint {
    Fingerprint::from_digest(keccak256(canonical_bytes(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{DepositRequest, RiskRequest, WithdrawRequest};

    const RECEIVER: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    fn deposit(assets: &str, receiver: &str) -> JobPayload {
        JobPayload::LpDeposit(DepositRequest {
            assets: assets.into(),
            receiver: receiver.into(),
        })
    }

    #[test]
    fn identical_requests_collide() {
        assert_eq!(
            fingerprint(&deposit("1000000", RECEIVER)),
            fingerprint(&deposit("1000000", RECEIVER))
        );
    }

    #[test]
    fn formatting_differences_collide() {
        let upper = RECEIVER.to_uppercase().replacen("0X", "0x", 1);
        assert_eq!(
            fingerprint(&deposit("1000000", RECEIVER)),
            fingerprint(&deposit("0xf4240", &upper))
        );
    }

    #[test]
    fn different_amounts_do_not_collide() {
        assert_ne!(
            fingerprint(&deposit("1000000", RECEIVER)),
            fingerprint(&deposit("1000001", RECEIVER))
        );
    }

    #[test]
    fn kind_is_part_of_the_fingerprint() {
        let withdraw = JobPayload::LpWithdraw(WithdrawRequest {
            assets: "1000000".into(),
            receiver: RECEIVER.into(),
            owner: RECEIVER.into(),
        });
        let risk = JobPayload::RiskSnapshot(RiskRequest {
            trader_address: RECEIVER.into(),
        });
        assert_ne!(fingerprint(&deposit("1000000", RECEIVER)), fingerprint(&withdraw));
        assert_ne!(fingerprint(&withdraw), fingerprint(&risk));
    }

    #[test]
    fn canonical_bytes_are_sorted_json() {
        let bytes = canonical_bytes(&deposit("1", RECEIVER));
        let text = String::from_utf8(bytes).unwrap();
        let (kind, body) = text.split_once('\n').unwrap();
        assert_eq!(kind, "lp_deposit");
        assert!(body.find("\"assets\"").unwrap() < body.find("\"receiver\"").unwrap());
    }
}
