//! Outbound adapters (driven side).

pub mod market;
pub mod position;
pub mod pricing;

pub use market::StaticMarketData;
pub use position::InMemoryPositionStore;
pub use pricing::BlackScholes;
