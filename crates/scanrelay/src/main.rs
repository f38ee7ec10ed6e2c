use std::process;

use anyhow::Result;
use clap::Parser;
use scanrelay::error::RelayError;
use scanrelay::{Cli, RelayConfig, logging};

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let config = RelayConfig::from_cli(cli).map_err(RelayError::from)?;
    scanrelay::serve(config).await?;
    Ok(())
}
