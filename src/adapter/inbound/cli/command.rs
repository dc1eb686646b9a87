//! Command-line interface definitions.
//!
//! Job commands (`deposit`, `withdraw`, `risk`) run one job through a local
//! runtime and stream its status changes. `check` and `decode` do not start
//! a runtime.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Vault calldata and option portfolio risk jobs
#[derive(Parser, Debug)]
#[command(name = "optivault")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build calldata for an ERC-4626 deposit
    Deposit(DepositArgs),

    /// Build calldata for an ERC-4626 withdrawal
    Withdraw(WithdrawArgs),

    /// Compute a risk snapshot for a trader's positions
    Risk(RiskArgs),

    /// Validate the configuration file
    Check,

    /// Decode vault calldata into its parameters
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Amount in token base units (decimal or 0x-hex)
    #[arg(long)]
    pub assets: String,

    /// Address credited with vault shares
    #[arg(long)]
    pub receiver: String,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Amount in token base units (decimal or 0x-hex)
    #[arg(long)]
    pub assets: String,

    /// Address receiving the withdrawn assets
    #[arg(long)]
    pub receiver: String,

    /// Address whose shares are burned
    #[arg(long)]
    pub owner: String,
}

#[derive(Args, Debug)]
pub struct RiskArgs {
    /// Trader whose positions are aggregated
    #[arg(long)]
    pub trader: String,

    /// JSON file with the trader's legs and optional quotes
    #[arg(long)]
    pub positions: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex calldata, with or without 0x prefix
    #[arg(long)]
    pub data: String,
}
