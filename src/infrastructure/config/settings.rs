//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section is optional in the TOML file except `[vault]`, whose address is
//! required because calldata jobs target it.
//!
//! # Example
//!
//! ```no_run
//! use optivault::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::logging::LoggingConfig;
use super::market::MarketConfig;
use super::risk::{PricingConfig, RiskConfig};
use super::runtime::{runtime_settings, CacheConfig, QueueConfig, WorkersConfig};
use super::vault::VaultConfig;
use crate::application::{MarginPolicy, RuntimeSettings};
use crate::domain::money::MAX_DECIMALS;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub workers: WorkersConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    /// Static quotes served to the risk engine.
    #[serde(default)]
    pub market: MarketConfig,
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Check that every value is within its accepted range.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(invalid("logging.format", "must be \"pretty\" or \"json\"")),
        }

        if self.workers.count == 0 {
            return Err(invalid("workers.count", "must be greater than 0"));
        }

        let queue = &self.queue;
        if queue.capacity == 0 {
            return Err(invalid("queue.capacity", "must be greater than 0"));
        }
        if queue.max_attempts == 0 {
            return Err(invalid("queue.max_attempts", "must be greater than 0"));
        }
        if queue.job_timeout_secs == 0 {
            return Err(invalid("queue.job_timeout_secs", "must be greater than 0"));
        }
        if queue.backoff_max_ms < queue.backoff_base_ms {
            return Err(invalid("queue.backoff_max_ms", "must be >= backoff_base_ms"));
        }
        if queue.sweep_interval_secs == 0 {
            return Err(invalid("queue.sweep_interval_secs", "must be greater than 0"));
        }

        match self.vault.address {
            None => return Err(ConfigError::MissingField { field: "vault.address" }),
            Some(address) if address == Address::ZERO => {
                return Err(invalid("vault.address", "must not be the zero address"));
            }
            Some(_) => {}
        }
        if self.vault.asset_decimals > MAX_DECIMALS {
            return Err(invalid("vault.asset_decimals", "must be 18 or less"));
        }

        let risk = &self.risk;
        if risk.price_shock_pct <= Decimal::ZERO || risk.price_shock_pct >= Decimal::ONE {
            return Err(invalid("risk.price_shock_pct", "must be between 0 and 1 (exclusive)"));
        }
        if risk.price_shock_steps == 0 {
            return Err(invalid("risk.price_shock_steps", "must be greater than 0"));
        }
        if risk.vol_shock_points < Decimal::ZERO {
            return Err(invalid("risk.vol_shock_points", "must be 0 or greater"));
        }

        if !self.pricing.risk_free_rate.is_finite() {
            return Err(invalid("pricing.risk_free_rate", "must be a finite number"));
        }

        for quote in &self.market.quotes {
            if quote.underlying.trim().is_empty() {
                return Err(invalid("market.quotes.underlying", "must not be empty"));
            }
            if quote.price <= Decimal::ZERO {
                return Err(invalid("market.quotes.price", "must be greater than 0"));
            }
            if quote.volatility <= Decimal::ZERO {
                return Err(invalid("market.quotes.volatility", "must be greater than 0"));
            }
        }

        Ok(())
    }

    /// Install the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Vault address; present on any validated config.
    pub fn vault_address(&self) -> std::result::Result<Address, ConfigError> {
        self.vault
            .address
            .ok_or(ConfigError::MissingField { field: "vault.address" })
    }

    #[must_use]
    pub fn runtime_settings(&self) -> RuntimeSettings {
        runtime_settings(&self.workers, &self.queue, &self.cache)
    }

    #[must_use]
    pub fn margin_policy(&self) -> MarginPolicy {
        MarginPolicy::from(&self.risk)
    }
}
