//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!   JobApi  ───────▶ │      Application        │
//!   (inbound)        │  dispatch / workers /   │
//!                    │  events / risk engine   │
//!                    └───────────┬─────────────┘
//!                                │
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!   ┌─────────────┐      ┌──────────────┐      ┌──────────────┐
//!   │PositionStore│      │MarketData    │      │PricingModel  │
//!   │  Adapter    │      │  Adapter     │      │  Adapter     │
//!   └─────────────┘      └──────────────┘      └──────────────┘
//! ```
//!
//! - [`inbound::JobApi`] - submission, subscription, cancellation, polling
//! - [`outbound::PositionStore`] - versioned, atomically readable leg storage
//! - [`outbound::MarketDataProvider`] - underlying price and volatility
//! - [`outbound::PricingModel`] - per-leg value and Greeks

pub mod inbound;
pub mod outbound;

pub use inbound::{JobApi, JobHandle, JobSubscription, RuntimeStats, SubmitOrigin};
pub use outbound::{
    MarketDataError, MarketDataProvider, MarketQuote, PositionChange, PositionStore, PricingError,
    PricingInput, PricingModel, StoreError,
};
