//! Optivault - job orchestration for vault calldata and option portfolio
//! risk.
//!
//! Callers submit jobs through [`port::inbound::JobApi`]. Equivalent
//! in-flight submissions collapse onto one job by fingerprint; a fixed
//! worker pool drains a FIFO queue with retry and backoff; every status
//! change is delivered in order to each subscriber; completed results are
//! cached until their TTL passes or the positions they were computed from
//! change.
//!
//! # Job kinds
//!
//! - `lp_deposit` / `lp_withdraw` - ERC-4626 calldata for liquidity actions
//! - `risk_snapshot` - net Greeks, scenario margin and unrealized P&L over a
//!   trader's strategy legs
//!
//! # Modules
//!
//! - [`domain`] - Jobs, legs, risk snapshots, calldata and fixed-point money
//! - [`port`] - Inbound job API and outbound position, market data and
//!   pricing traits
//! - [`application`] - Dispatcher, queue, worker pool, events, cache and the
//!   risk engine
//! - [`adapter`] - In-memory store, static market data, Black-Scholes, CLI
//! - [`infrastructure`] - Configuration, logging and wiring
//!
//! # Example
//!
//! ```no_run
//! use optivault::domain::{DepositRequest, JobPayload};
//! use optivault::infrastructure::bootstrap::build_local;
//! use optivault::infrastructure::config::Config;
//! use optivault::port::inbound::JobApi;
//!
//! # async fn run() -> optivault::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let services = build_local(&config)?;
//! services.runtime.start();
//!
//! let handle = services.runtime.submit(JobPayload::LpDeposit(DepositRequest {
//!     assets: "1000000".into(),
//!     receiver: "0xde709f2102306220921060314715629080e2fb77".into(),
//! }))?;
//! let outcome = handle.wait().await;
//! println!("{outcome:?}");
//!
//! services.runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
