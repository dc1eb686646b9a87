//! Worker, queue and cache configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::{RetryPolicy, RuntimeSettings};

/// Worker pool sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Number of concurrent workers (default: logical CPUs).
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

/// Queue, retry and retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of waiting jobs before submissions are rejected.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Attempt ceiling for transient failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    /// First retry delay in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Retry delay ceiling in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// How long finished jobs stay queryable, in seconds.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

const fn default_capacity() -> usize {
    10_000
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_job_timeout_secs() -> u64 {
    30
}

const fn default_backoff_base_ms() -> u64 {
    200
}

const fn default_backoff_max_ms() -> u64 {
    10_000
}

const fn default_retention_secs() -> u64 {
    600
}

const fn default_sweep_interval_secs() -> u64 {
    30
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_attempts: default_max_attempts(),
            job_timeout_secs: default_job_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

const fn default_ttl_secs() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Assemble runtime settings from the three sections.
#[must_use]
pub fn runtime_settings(
    workers: &WorkersConfig,
    queue: &QueueConfig,
    cache: &CacheConfig,
) -> RuntimeSettings {
    RuntimeSettings {
        workers: workers.count,
        queue_capacity: queue.capacity,
        job_timeout: Duration::from_secs(queue.job_timeout_secs),
        retry: queue.retry_policy(),
        cache_ttl: Duration::from_secs(cache.ttl_secs),
        retention: Duration::from_secs(queue.retention_secs),
        sweep_interval: Duration::from_secs(queue.sweep_interval_secs),
    }
}
