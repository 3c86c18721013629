//! Options protocol indexer.
//!
//! # Overview
//!
//! Deterministic, incremental reducer of on-chain options protocol events
//! into a relational snapshot: option and pool metadata, per-user positions,
//! normalized actions, fee accounting and hour/day activity rollups.
//!
//! Use [`state::Indexer`] with any [`store::Store`], [`reader::ContractReader`]
//! and [`watch::Subscriptions`] implementation, then feed it blocks from
//! [`stream::raw`] via [`state::Indexer::apply_events`], or single decoded events via
//! [`state::Indexer::apply_event`].
//!
//! Every event is reduced into a staged write batch which is committed only
//! when the reduction completes, so a skipped or failed event leaves the store
//! untouched.
//!
//! # Limitations/follow-ups
//!
//! * Pools announced before their option are dropped rather than deferred.
//!
//! * Accumulations rely on single delivery of every event, replaying
//!   a block that was already committed to a persistent store double-counts.
//!
//! # Testing
//!
//! [`testing`] module provides a scriptable contract reader and fixtures to
//! build protocol events without a node.

pub mod abi;
pub mod error;
pub mod ids;
pub mod num;
pub mod reader;
pub mod state;
pub mod store;
pub mod stream;
pub mod testing;
pub mod types;
pub mod watch;

use alloy::primitives::Address;

#[derive(Clone, Debug)]
/// Protocol deployment the indexer follows.
pub struct Deployment {
    chain_id: u64,
    configuration_manager: Address,
    deployed_at_block: u64,
}

impl Deployment {
    pub fn custom(chain_id: u64, configuration_manager: Address, deployed_at_block: u64) -> Self {
        Self {
            chain_id,
            configuration_manager,
            deployed_at_block,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Root contract announcing modules and ownership changes.
    pub fn configuration_manager(&self) -> Address {
        self.configuration_manager
    }

    pub fn deployed_at_block(&self) -> u64 {
        self.deployed_at_block
    }
}
