use std::{collections::HashMap, time::Duration};

use alloy::{
    eips::BlockNumberOrTag,
    network::TransactionResponse,
    primitives::{Address, Log, TxHash},
    providers::Provider,
    rpc::types::Filter,
};
use futures::{Stream, stream};

use crate::{Deployment, abi, error::IndexerError, types};

pub type RawEvent = types::EventContext<Log>;
pub type RawBlockEvents = types::BlockEvents<RawEvent>;

/// Returns stream of raw protocol logs, batched per block, starting from
/// the specified block.
///
/// Logs are selected by event signature only, as the set of watched
/// contracts grows while indexing. Filtering by emitter happens in
/// [`crate::state::Indexer::apply_events`].
///
/// Polls blocks via the given [`Provider`] to produce strictly continuous
/// block sequence, with [`Provider`]-configured interval.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
pub fn raw<P, S, SFut>(
    deployment: &Deployment,
    provider: P,
    from: types::StateInstant,
    sleep: S,
) -> impl Stream<Item = Result<RawBlockEvents, IndexerError>> + use<P, S, SFut>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let block_num = from.block_number().max(deployment.deployed_at_block());
    stream::unfold((provider, block_num), move |(provider, mut block_num)| async move {
        loop {
            let result = fetch_block(&provider, block_num).await;
            if result.is_ok() {
                block_num += 1;
                return Some((result, (provider, block_num)));
            }
            if matches!(result, Err(IndexerError::InvalidRequest(_))) {
                // Block is not available yet
                sleep(provider.client().poll_interval()).await;
                continue;
            }
            return Some((result, (provider, block_num)));
        }
    })
}

async fn fetch_block<P: Provider>(
    provider: &P,
    block_num: u64,
) -> Result<RawBlockEvents, IndexerError> {
    let filter = Filter::new()
        .from_block(block_num)
        .to_block(block_num)
        .event_signature(abi::event_signatures());
    let (block, logs) = futures::try_join!(
        async {
            provider
                .get_block_by_number(BlockNumberOrTag::Number(block_num))
                .full()
                .await
                .map_err(IndexerError::from)
        },
        async { provider.get_logs(&filter).await.map_err(IndexerError::from) },
    )?;
    // Some nodes return empty logs instead of an error for a block past the tip
    let Some(block) = block else {
        return Err(IndexerError::InvalidRequest(
            "block is not available yet".to_string(),
        ));
    };

    let senders: HashMap<TxHash, Address> = block
        .transactions
        .txns()
        .map(|tx| (tx.tx_hash(), tx.from()))
        .collect();

    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        let tx_hash = log.transaction_hash.unwrap_or_default();
        events.push(RawEvent::new(
            tx_hash,
            senders.get(&tx_hash).copied().unwrap_or_default(),
            log.transaction_index.unwrap_or_default(),
            log.log_index.unwrap_or_default(),
            log.inner.address,
            log.inner,
        ));
    }
    Ok(RawBlockEvents::new(
        types::StateInstant::new(block_num, block.header.timestamp),
        events,
    ))
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::address, providers::ProviderBuilder, rpc::client::RpcClient,
        transports::layers::RetryBackoffLayer,
    };
    use futures::StreamExt;

    use super::*;

    fn mainnet() -> Deployment {
        Deployment::custom(
            1,
            address!("0x0000000000000000000000000000000000000001"),
            0,
        )
    }

    #[tokio::test]
    #[ignore = "requires a node with the protocol deployed"]
    async fn test_stream_historical_blocks() {
        let provider = ProviderBuilder::new()
            .connect("https://eth.llamarpc.com")
            .await
            .unwrap();

        let from_block = 21_000_000;
        let stream = raw(
            &mainnet(),
            provider,
            types::StateInstant::new(from_block, 0),
            tokio::time::sleep,
        );
        let block_results = stream.take(20).collect::<Vec<_>>().await;

        let mut block_num = from_block;
        for b in &block_results {
            let block = b.as_ref().unwrap();
            assert_eq!(block.instant().block_number(), block_num);
            assert!(block.instant().block_timestamp() > 0);
            for event in block.events() {
                assert_eq!(event.address(), event.event().address);
                assert!(!event.tx_from().is_zero());
            }
            block_num += 1;
        }
    }

    #[tokio::test]
    #[ignore = "requires a node"]
    async fn test_stream_recent_blocks() {
        let client = RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect("https://eth.llamarpc.com")
            .await
            .unwrap();
        client.set_poll_interval(Duration::from_millis(500));
        let provider = ProviderBuilder::new().connect_client(client);

        let mut block_num = provider.get_block_number().await.unwrap() + 1;
        let stream = raw(
            &mainnet(),
            provider,
            types::StateInstant::new(block_num, 0),
            tokio::time::sleep,
        );
        let block_results = stream.take(3).collect::<Vec<_>>().await;

        for b in &block_results {
            assert_eq!(b.as_ref().unwrap().instant().block_number(), block_num);
            block_num += 1;
        }
    }
}
