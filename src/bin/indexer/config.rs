//! Configuration for the indexer.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection and deployment details
//! - CLI arguments: block range and feature switches, overriding the environment

use alloy::primitives::Address;
use clap::Parser;
use options_indexer::{Deployment, state::IndexerOptions};

/// Environment configuration (connection and deployment details).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Chain ID (e.g., 1 for Ethereum mainnet)
    pub chain_id: u64,

    /// Configuration manager contract address
    pub configuration_manager_address: String,

    /// Block number when the configuration manager was deployed
    pub deployed_at_block: u64,

    /// Record wallet to wallet option transfers (default: false)
    pub track_transfers: Option<bool>,

    /// Snapshot live pool state onto actions (default: false)
    pub live_tracking: Option<bool>,

    /// Maintain hour/day activity rollups (default: true)
    pub track_activity: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the configuration manager address.
    pub fn configuration_manager_address(
        &self,
    ) -> Result<Address, alloy::primitives::hex::FromHexError> {
        self.configuration_manager_address.parse()
    }

    pub fn deployment(&self) -> Result<Deployment, alloy::primitives::hex::FromHexError> {
        Ok(Deployment::custom(
            self.chain_id,
            self.configuration_manager_address()?,
            self.deployed_at_block,
        ))
    }
}

/// CLI arguments of the indexer.
#[derive(Debug, Parser)]
#[command(name = "indexer")]
#[command(about = "Index options protocol events into an in-memory snapshot")]
pub struct CliConfig {
    /// Block to start from (default: deployment block)
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Stop after indexing this many blocks
    #[arg(long)]
    pub blocks: Option<u64>,

    /// Record wallet to wallet option transfers
    #[arg(long)]
    pub track_transfers: bool,

    /// Snapshot live pool state onto actions
    #[arg(long)]
    pub live_tracking: bool,

    /// Skip hour/day activity rollups
    #[arg(long)]
    pub no_activity: bool,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub poll_interval: u64,
}

impl CliConfig {
    /// Merges the feature switches, CLI flags taking precedence over the environment.
    pub fn indexer_options(&self, env: &EnvConfig) -> IndexerOptions {
        let defaults = IndexerOptions::default();
        IndexerOptions {
            track_transfers: self.track_transfers
                || env.track_transfers.unwrap_or(defaults.track_transfers),
            live_tracking: self.live_tracking || env.live_tracking.unwrap_or(defaults.live_tracking),
            track_activity: !self.no_activity
                && env.track_activity.unwrap_or(defaults.track_activity),
        }
    }

    /// First block to index, never before the deployment.
    pub fn start_block(&self, deployment: &Deployment) -> u64 {
        self.from_block
            .unwrap_or(deployment.deployed_at_block())
            .max(deployment.deployed_at_block())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvConfig {
        EnvConfig {
            node_rpc_url: "http://localhost:8545".to_string(),
            chain_id: 1,
            configuration_manager_address: "0x00000000000000000000000000000000000c0f19".to_string(),
            deployed_at_block: 100,
            track_transfers: None,
            live_tracking: Some(true),
            track_activity: None,
        }
    }

    fn cli() -> CliConfig {
        CliConfig {
            from_block: None,
            blocks: None,
            track_transfers: false,
            live_tracking: false,
            no_activity: false,
            poll_interval: 1000,
        }
    }

    #[test]
    fn test_options_merge() {
        let options = cli().indexer_options(&env());
        assert!(!options.track_transfers);
        assert!(options.live_tracking);
        assert!(options.track_activity);

        let cli = CliConfig {
            track_transfers: true,
            no_activity: true,
            ..cli()
        };
        let options = cli.indexer_options(&env());
        assert!(options.track_transfers);
        assert!(!options.track_activity);
    }

    #[test]
    fn test_start_block_clamped_to_deployment() {
        let deployment = env().deployment().unwrap();
        assert_eq!(cli().start_block(&deployment), 100);

        let early = CliConfig {
            from_block: Some(5),
            ..cli()
        };
        assert_eq!(early.start_block(&deployment), 100);

        let late = CliConfig {
            from_block: Some(500),
            ..cli()
        };
        assert_eq!(late.start_block(&deployment), 500);
    }
}
