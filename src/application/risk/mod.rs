//! Portfolio risk: snapshot aggregation and scenario margin.

pub mod engine;
pub mod margin;

pub use engine::RiskEngine;
pub use margin::{MarginPolicy, MarginResult, ScenarioLeg};
