//! Application services.
//!
//! These services implement the job lifecycle and risk use cases on top of
//! the domain and the outbound ports.

pub mod backoff;
pub mod cache;
pub mod dispatch;
pub mod events;
pub mod processor;
pub mod queue;
pub mod registry;
pub mod risk;
pub mod runtime;
pub mod worker;

pub use backoff::{RetryDecision, RetryPolicy};
pub use cache::{CachedResult, Dependency, ResultCache};
pub use dispatch::Dispatcher;
pub use events::EventChannel;
pub use processor::{CalldataEncoder, Processors};
pub use queue::{JobQueue, QueuedJob};
pub use registry::{ClaimedJob, JobRegistry};
pub use risk::{MarginPolicy, RiskEngine};
pub use runtime::{JobRuntime, RuntimeSettings, SweepReport};
pub use worker::{WorkerContext, WorkerPool};
