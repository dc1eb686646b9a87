//! `optivault check`: validate the configuration without starting a runtime.

use std::path::Path;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::Config;

pub fn execute(config_path: &Path) -> Result<bool> {
    let config = Config::load(config_path)?;
    let settings = config.runtime_settings();

    output::section("Configuration Check");
    output::field("Config", config_path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Vault", config.vault_address()?);
    output::field("Asset decimals", config.vault.asset_decimals);
    output::field("Workers", settings.workers);
    output::field("Queue capacity", settings.queue_capacity);
    output::field("Max attempts", settings.retry.max_attempts());
    output::field("Job timeout", format!("{}s", settings.job_timeout.as_secs()));
    output::field("Cache TTL", format!("{}s", settings.cache_ttl.as_secs()));
    output::field("Cross margin", config.risk.cross_margin);

    if config.market.quotes.is_empty() {
        output::warning("No market quotes configured; risk jobs need quotes from a positions file");
    } else {
        let underlyings: Vec<&str> = config
            .market
            .quotes
            .iter()
            .map(|q| q.underlying.as_str())
            .collect();
        output::field("Quotes", underlyings.join(", "));
    }

    Ok(true)
}
