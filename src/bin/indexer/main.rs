//! Options protocol indexer.
//!
//! This binary follows the protocol deployment from its configuration
//! manager and reduces every event into an in-memory snapshot.

mod config;
mod error;
mod runner;

use std::{process::exit, time::Duration};

use clap::Parser;
use tracing::error;

use config::{CliConfig, EnvConfig};
use runner::IndexerRunner;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

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

    let deployment = match env_config.deployment() {
        Ok(deployment) => deployment,
        Err(e) => {
            eprintln!("Invalid configuration manager address: {}", e);
            exit(1);
        }
    };

    let options = cli_config.indexer_options(&env_config);
    let start_block = cli_config.start_block(&deployment);

    let mut runner = match IndexerRunner::try_new(
        &env_config.node_rpc_url,
        deployment,
        options,
        start_block,
        cli_config.blocks,
        Duration::from_millis(cli_config.poll_interval),
    ) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to create indexer: {}", e);
            exit(1);
        }
    };

    if let Err(e) = runner.run().await {
        error!(%e, "Indexer encountered an error, shutting down");
        exit(1);
    }
}
