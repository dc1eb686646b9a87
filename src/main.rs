use clap::Parser;
use optivault::adapter::inbound::cli::command::Cli;
use optivault::adapter::inbound::cli::{execute, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match execute(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
