//! Command-line adapter.

pub mod check;
pub mod command;
pub mod decode;
pub mod job;
pub mod output;
pub mod positions;

use command::{Cli, Commands};

use crate::error::Result;

/// Run the parsed command. `Ok(false)` means the command ran but its job
/// did not complete.
pub async fn execute(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Deposit(args) => job::deposit(&cli.config, args).await,
        Commands::Withdraw(args) => job::withdraw(&cli.config, args).await,
        Commands::Risk(args) => job::risk(&cli.config, args).await,
        Commands::Check => check::execute(&cli.config),
        Commands::Decode(args) => decode::execute(args),
    }
}
