//! Inbound (driving) ports consumed by inbound adapters such as the CLI.

pub mod jobs;

pub use jobs::{JobApi, JobHandle, JobSubscription, RuntimeStats, SubmitOrigin};
