//! Outbound ports (driven side): interfaces implemented by outbound adapters.

pub mod market;
pub mod position;
pub mod pricing;

pub use market::{MarketDataError, MarketDataProvider, MarketQuote};
pub use position::{PositionChange, PositionStore, StoreError};
pub use pricing::{PricingError, PricingInput, PricingModel};
