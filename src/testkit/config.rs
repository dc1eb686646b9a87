//! Canonical test configurations.
//!
//! Single source of truth for config used across tests.

use std::time::Duration;

use crate::application::{RetryPolicy, RuntimeSettings};

/// Minimal valid TOML with the test vault.
pub const MINIMAL_TOML: &str = r#"
[vault]
address = "0x27b1fdb04752bbc536007a920d24acb045561c26"
asset_decimals = 6
"#;

/// Small, fast settings: two workers, short timeout, millisecond backoff
/// without jitter.
pub fn fast_settings() -> RuntimeSettings {
    RuntimeSettings {
        workers: 2,
        queue_capacity: 64,
        job_timeout: Duration::from_secs(2),
        retry: RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(40))
            .without_jitter(),
        cache_ttl: Duration::from_secs(60),
        retention: Duration::from_secs(60),
        sweep_interval: Duration::from_secs(60),
    }
}
