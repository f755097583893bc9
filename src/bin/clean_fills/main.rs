//! Fill cleaner.
//!
//! Reads raw order fills of a binary market from CSV, resolves the market
//! outcome tokens and writes one canonical trade per transaction and outcome.

mod config;
mod error;

use std::process::exit;

use clap::Parser;
use ctf_fills::{csv_io, fill::TradeProcessor, num::Converter, resolve};
use tracing::{error, info};

use config::{CliConfig, EnvConfig};
use error::Result;

fn run(cli_config: &CliConfig, env_config: &EnvConfig) -> Result<()> {
    // Validate everything before touching the input
    let resolver_input = cli_config.to_resolver_input(env_config.default_market()?)?;
    let perspective = cli_config.perspective()?;

    let fills = csv_io::read_fills_file(&cli_config.input, Converter::default())?;
    info!(path = %cli_config.input.display(), fills = fills.len(), "loaded fills");

    let (market, source) = resolve::resolve_market(&resolver_input, &fills)?;
    let trades = TradeProcessor::new(market.clone(), perspective, cli_config.metadata()).process(fills)?;

    csv_io::write_trades_file(&cli_config.output, &trades)?;
    info!(
        path = %cli_config.output.display(),
        trades = trades.len(),
        %source,
        yes = %market.yes_token(),
        no = %market.no_token(),
        "wrote trades"
    );
    Ok(())
}

fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(&cli_config, &env_config) {
        error!(%e, "Failed to clean fills");
        exit(1);
    }
}
