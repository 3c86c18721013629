//! Indexing loop over the node's block stream.

use std::{pin::pin, time::Duration};

use alloy::{
    providers::{DynProvider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use futures::StreamExt;
use options_indexer::{
    Deployment,
    reader::RpcReader,
    state::{Action, Indexer, IndexerOptions, OptionSeries, Pool, Position, User},
    store::MemoryStore,
    stream,
    types::StateInstant,
    watch::Watchlist,
};
use tracing::{error, info, warn};
use url::Url;

use crate::error::{Error, Result};

type RpcIndexer = Indexer<MemoryStore, RpcReader<DynProvider>, Watchlist>;

/// Drives an in-memory indexer from the given block onwards.
#[derive(Debug)]
pub struct IndexerRunner {
    provider: DynProvider,
    deployment: Deployment,
    indexer: RpcIndexer,
    blocks: Option<u64>,
}

impl IndexerRunner {
    pub fn try_new(
        node_rpc_url: &str,
        deployment: Deployment,
        options: IndexerOptions,
        start_block: u64,
        blocks: Option<u64>,
        poll_interval: Duration,
    ) -> Result<Self> {
        info!(
            chain_id = deployment.chain_id(),
            configuration_manager = %deployment.configuration_manager(),
            start_block,
            ?options,
            "Initializing indexer"
        );

        let node_url = Url::parse(node_rpc_url)?;
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .http(node_url);
        client.set_poll_interval(poll_interval);
        let provider = DynProvider::new(ProviderBuilder::new().connect_client(client));

        let indexer = Indexer::new(
            MemoryStore::new(),
            RpcReader::new(provider.clone()),
            Watchlist::new(deployment.configuration_manager()),
            options,
            StateInstant::new(start_block.saturating_sub(1), 0),
        );

        Ok(Self {
            provider,
            deployment,
            indexer,
            blocks,
        })
    }

    /// Runs until the requested number of blocks is indexed, restarting
    /// the stream on transport failures.
    pub async fn run(&mut self) -> Result<()> {
        let first_block = self.indexer.instant().block_number() + 1;
        loop {
            let from = self.indexer.instant().block_number() + 1;
            info!(from, "Starting block stream");
            let mut blocks = pin!(stream::raw(
                &self.deployment,
                self.provider.clone(),
                StateInstant::new(from, 0),
                tokio::time::sleep,
            ));

            loop {
                let Some(block) = blocks.next().await else {
                    return Err(Error::StreamClosed);
                };
                let block = match block {
                    Ok(block) => block,
                    Err(e) => {
                        warn!(%e, "Error in block stream, restarting");
                        break;
                    }
                };

                if let Err(e) = self.indexer.apply_events(&block).await {
                    error!(%e, "Failed to apply block");
                    return Err(e.into());
                }

                let indexed = self.indexer.instant().block_number() + 1 - first_block;
                if self.blocks.is_some_and(|limit| indexed >= limit) {
                    self.log_summary();
                    return Ok(());
                }
            }
        }
    }

    fn log_summary(&self) {
        let store = self.indexer.store();
        info!(
            block = self.indexer.instant().block_number(),
            options = store.count::<OptionSeries>(),
            pools = store.count::<Pool>(),
            users = store.count::<User>(),
            positions = store.count::<Position>(),
            actions = store.count::<Action>(),
            watched = self.indexer.watches().len(),
            "Indexing finished"
        );
    }
}
