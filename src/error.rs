use std::time::Duration;

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::failure::FailureClass;
use crate::domain::job::InvalidTransition;
use crate::domain::JobId;
use crate::port::outbound::StoreError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Job failure taxonomy. Processors classify their own failures; the worker
/// pool applies retry policy by [`JobError::class`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("dependency unavailable: {0}")]
    TransientDependency(String),

    #[error("inconsistent position read: {0}")]
    Consistency(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("job exceeded its time budget of {0:?}")]
    Timeout(Duration),

    #[error("job cancelled")]
    Cancelled,

    /// The attempt panicked. Never retried.
    #[error("attempt panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Retry class applied by the worker pool.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Validation(_) | Self::Cancelled | Self::Panicked(_) => FailureClass::Permanent,
            Self::TransientDependency(_) | Self::Timeout(_) | Self::ResourceExhausted(_) => {
                FailureClass::Transient
            }
            Self::Consistency(_) => FailureClass::Consistency,
        }
    }
}

impl From<DomainError> for JobError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error("runtime is not accepting submissions")]
    NotAccepting,

    #[error("unknown job {0}")]
    UnknownJob(JobId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
