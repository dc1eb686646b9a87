//! Positions file read by `optivault risk`.
//!
//! ```json
//! {
//!   "legs": [
//!     {
//!       "seriesId": "ETH-20261231-2500-C",
//!       "underlying": "ETH",
//!       "side": "buy",
//!       "optionType": "call",
//!       "size": 5,
//!       "strike": "2500",
//!       "expiry": "2026-12-31T08:00:00Z",
//!       "premium": "120.5"
//!     }
//!   ],
//!   "quotes": [{ "underlying": "ETH", "price": "2450", "volatility": "0.62" }]
//! }
//! ```
//!
//! `quotes` is optional and overrides configured marks of the same
//! underlying.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{DomainError, OptionType, SeriesId, Side, StrategyLeg};
use crate::error::Result;
use crate::infrastructure::config::market::QuoteConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegRecord {
    pub series_id: String,
    pub underlying: String,
    pub side: Side,
    pub option_type: OptionType,
    pub size: i64,
    pub strike: Decimal,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub premium: Decimal,
}

impl LegRecord {
    pub fn to_leg(&self) -> std::result::Result<StrategyLeg, DomainError> {
        StrategyLeg::try_new(
            SeriesId::new(self.series_id.clone()),
            self.underlying.clone(),
            self.side,
            self.option_type,
            self.size,
            self.strike,
            self.expiry,
            self.premium,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionsFile {
    #[serde(default)]
    pub legs: Vec<LegRecord>,
    #[serde(default)]
    pub quotes: Vec<QuoteConfig>,
}

impl PositionsFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Validated legs, failing on the first invalid record.
    pub fn legs(&self) -> Result<Vec<StrategyLeg>> {
        let legs = self
            .legs
            .iter()
            .map(LegRecord::to_leg)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FILE: &str = r#"{
        "legs": [
            {
                "seriesId": "ETH-20261231-2500-C",
                "underlying": "ETH",
                "side": "buy",
                "optionType": "call",
                "size": 5,
                "strike": "2500",
                "expiry": "2026-12-31T08:00:00Z",
                "premium": 120.5
            },
            {
                "seriesId": "ETH-20261231-2000-P",
                "underlying": "ETH",
                "side": "sell",
                "optionType": "put",
                "size": 2,
                "strike": 2000,
                "expiry": "2026-12-31T08:00:00Z"
            }
        ],
        "quotes": [{ "underlying": "ETH", "price": "2450", "volatility": "0.62" }]
    }"#;

    #[test]
    fn parses_legs_and_quotes() {
        let file = PositionsFile::parse(FILE).unwrap();
        let legs = file.legs().unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].signed_quantity(), 5);
        assert_eq!(legs[1].signed_quantity(), -2);
        assert_eq!(legs[0].premium(), dec!(120.5));
        assert_eq!(legs[1].premium(), Decimal::ZERO);
        assert_eq!(file.quotes[0].price, dec!(2450));
    }

    #[test]
    fn zero_size_leg_is_rejected() {
        let file = PositionsFile::parse(
            r#"{"legs": [{"seriesId": "X", "underlying": "ETH", "side": "buy",
                "optionType": "put", "size": 0, "strike": 10,
                "expiry": "2026-12-31T08:00:00Z"}]}"#,
        )
        .unwrap();
        assert!(file.legs().is_err());
    }

    #[test]
    fn empty_file_has_no_legs() {
        let file = PositionsFile::parse("{}").unwrap();
        assert!(file.legs().unwrap().is_empty());
    }
}
