//! Failure classification shared by processors and the worker pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the worker pool treats a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Malformed input; retrying cannot help.
    Permanent,
    /// Dependency hiccup; retry with backoff up to the attempt ceiling.
    Transient,
    /// Position set moved under the reader; retried once.
    Consistency,
}

impl FailureClass {
    /// The caller-facing kind reported for this class.
    #[must_use]
    pub const fn kind(self) -> FailureKind {
        match self {
            Self::Permanent => FailureKind::Permanent,
            Self::Transient | Self::Consistency => FailureKind::Transient,
        }
    }
}

/// Caller-visible failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transient,
    Permanent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Failure payload attached to a job that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

impl JobFailure {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts,
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failure after {} attempt(s): {}",
            self.kind, self.attempts, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_is_reported_as_transient() {
        assert_eq!(FailureClass::Consistency.kind(), FailureKind::Transient);
        assert_eq!(FailureClass::Permanent.kind(), FailureKind::Permanent);
    }

    #[test]
    fn failure_serializes_with_lowercase_kind() {
        let failure = JobFailure::new(FailureKind::Permanent, "bad receiver", 1);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "permanent");
        assert_eq!(json["attempts"], 1);
    }
}
