//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Addresses, legs and payload builders.
//! - [`pricing`] - Deterministic [`PricingModel`](crate::port::outbound::PricingModel) doubles.
//! - [`market`] - Scripted [`MarketDataProvider`](crate::port::outbound::MarketDataProvider).
//! - [`position`] - Position store wrappers that inject failures.
//! - [`config`] - Canonical test configurations and fast runtime settings.
//! - [`runtime`] - Runtime builders wired to the doubles above.

pub mod config;
pub mod domain;
pub mod market;
pub mod position;
pub mod pricing;
pub mod runtime;
