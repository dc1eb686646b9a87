//! Infrastructure configuration modules.

pub mod logging;
pub mod market;
pub mod risk;
pub mod runtime;
pub mod settings;
pub mod vault;

pub use settings::Config;
