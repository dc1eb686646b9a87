//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and parsing helpers
//! when an invariant is violated. Processors surface them as permanent job
//! failures.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use optivault::domain::error::DomainError;
//! use optivault::domain::leg::{OptionType, Side, StrategyLeg};
//! use optivault::domain::id::SeriesId;
//! use rust_decimal_macros::dec;
//!
//! let result = StrategyLeg::try_new(
//!     SeriesId::new("ETH-20270101-3000-C"),
//!     "ETH",
//!     Side::Buy,
//!     OptionType::Call,
//!     0, // flat legs are not legs
//!     dec!(3000),
//!     Utc.with_ymd_and_hms(2027, 1, 1, 8, 0, 0).unwrap(),
//!     dec!(120),
//! );
//!
//! assert!(matches!(result, Err(DomainError::ZeroSize)));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A leg must hold a non-zero number of contracts.
    #[error("leg size must be non-zero")]
    ZeroSize,

    /// Leg sizes are bounded by [`MAX_LEG_SIZE`](crate::domain::leg::MAX_LEG_SIZE).
    #[error("leg size {size} exceeds the limit of {max} contracts")]
    SizeOutOfRange {
        /// The size that was provided.
        size: i64,
        /// Largest accepted absolute size.
        max: i64,
    },

    /// Strikes are prices and must be positive.
    #[error("strike must be positive, got {strike}")]
    NonPositiveStrike {
        /// The invalid strike that was provided.
        strike: Decimal,
    },

    /// Premium is an absolute amount paid or received.
    #[error("premium cannot be negative, got {premium}")]
    NegativePremium {
        /// The invalid premium that was provided.
        premium: Decimal,
    },

    /// Underlying symbols identify margin groups and cannot be blank.
    #[error("underlying cannot be empty")]
    EmptyUnderlying,

    /// An integer amount could not be parsed.
    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount {
        /// Raw input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// An amount that must be strictly positive was zero.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// An EVM address could not be parsed.
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress {
        /// Raw input.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// The zero address is never a valid receiver or owner.
    #[error("{field} cannot be the zero address")]
    ZeroAddress {
        /// Which parameter carried the zero address.
        field: &'static str,
    },

    /// Token decimals outside the supported range.
    #[error("unsupported token decimals {decimals} (max {max})")]
    UnsupportedDecimals {
        /// Requested decimals.
        decimals: u8,
        /// Largest supported value.
        max: u8,
    },

    /// A fixed-point conversion did not fit the target representation.
    #[error("amount {amount} does not fit in {target}")]
    Overflow {
        /// Value being converted.
        amount: String,
        /// Target representation.
        target: &'static str,
    },

    /// Risk arithmetic left the range of `Decimal`.
    #[error("arithmetic overflow while computing {context}")]
    ArithmeticOverflow {
        /// Quantity being computed.
        context: &'static str,
    },

    /// Negative values cannot be expressed as on-chain unsigned units.
    #[error("negative amount {amount} cannot be converted to token units")]
    NegativeUnits {
        /// The offending amount.
        amount: Decimal,
    },

    /// Encoded calldata did not match any supported vault function.
    #[error("calldata could not be decoded: {reason}")]
    UndecodableCalldata {
        /// Decoder message.
        reason: String,
    },
}
