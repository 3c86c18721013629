use alloy::primitives::Address;

use super::ProtocolEvents;
use crate::{
    abi::{
        factory::{OptionAMMFactory::OptionAMMFactoryEvents, OptionFactory::OptionFactoryEvents},
        helper::OptionHelper::OptionHelperEvents,
        manager::ConfigurationManager::ConfigurationManagerEvents,
        option::PodOption::PodOptionEvents,
        pool::{FeePool::FeePoolEvents, OptionAMMPool::OptionAMMPoolEvents},
    },
    error::IndexerError,
    reader::ContractReader,
    store::{Batch, Changes, Store},
    stream,
    types::{self, EventContext},
    watch::{Subscriptions, WatchKind},
};

pub type AppliedBlockEvents = types::BlockEvents<EventContext<Applied>>;

/// Optional reducer features.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexerOptions {
    /// Record wallet to wallet option transfers as actions (default: off).
    pub track_transfers: bool,

    /// Snapshot pool and token state onto every action (default: off).
    pub live_tracking: bool,

    /// Maintain hour/day activity rollups (default: on).
    pub track_activity: bool,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            track_transfers: false,
            live_tracking: false,
            track_activity: true,
        }
    }
}

/// Outcome of reducing a single event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// All derived writes committed.
    Done,

    /// Nothing written.
    Skipped(SkipReason),
}

/// Reason an event left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Option, pool or another referenced entity is not indexed.
    MissingDependency,

    /// Entity or action already recorded.
    Duplicate,

    /// Log does not match the schema of the emitting contract.
    Undecodable,

    /// Emitting contract is not watched.
    Unwatched,

    /// Event handling is switched off by [`IndexerOptions`].
    Disabled,

    /// Event carries no indexed state.
    Ignored,
}

impl Applied {
    pub fn is_done(&self) -> bool {
        matches!(self, Applied::Done)
    }
}

/// Reducer of protocol events into the entities of a [`Store`].
///
/// Every event is reduced into a [`Batch`] on top of the store, which is
/// committed only if the reduction completes, so skipped or failed events
/// leave no partial writes behind. Contracts discovered by an event are
/// registered with the [`Subscriptions`] on commit.
#[derive(Debug)]
pub struct Indexer<S, R, W> {
    store: S,
    reader: R,
    watches: W,
    options: IndexerOptions,
    instant: types::StateInstant,
}

impl<S: Store, R: ContractReader, W: Subscriptions> Indexer<S, R, W> {
    /// Creates an indexer whose state is up to date with the given instant.
    pub fn new(
        store: S,
        reader: R,
        watches: W,
        options: IndexerOptions,
        instant: types::StateInstant,
    ) -> Self {
        Self {
            store,
            reader,
            watches,
            options,
            instant,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn watches(&self) -> &W {
        &self.watches
    }

    pub fn options(&self) -> IndexerOptions {
        self.options
    }

    /// Instant of the last applied block.
    pub fn instant(&self) -> types::StateInstant {
        self.instant
    }

    pub fn into_parts(self) -> (S, R, W) {
        (self.store, self.reader, self.watches)
    }

    /// Reduces raw events of the next block.
    ///
    /// Blocks expected to arrive strictly in-order, with already applied
    /// blocks being ignored, as accumulated counters can not tolerate
    /// double delivery.
    ///
    /// # Returns
    ///
    /// On success, the outcome of every raw event of the block, in emission order.
    ///
    /// On failure, the corresponding [`IndexerError`], after which the block
    /// is partially applied up to the failed event and indexing should not continue.
    pub async fn apply_events(
        &mut self,
        events: &stream::RawBlockEvents,
    ) -> Result<Option<AppliedBlockEvents>, IndexerError> {
        let next_instant = events.instant();
        if self.instant >= next_instant {
            // Block already applied
            return Ok(None);
        }
        if self.instant.block_number() + 1 < next_instant.block_number() {
            // Block arrived out of order
            return Err(IndexerError::BlockOutOfOrder(
                self.instant.block_number() + 1,
                next_instant.block_number(),
            ));
        }

        let mut applied = Vec::with_capacity(events.events().len());
        for event in events.events() {
            let result = self.apply_raw_event(next_instant, event).await?;
            applied.push(event.pass(result));
        }
        self.instant = next_instant;

        let done = applied.iter().filter(|e| e.event().is_done()).count();
        if done > 0 {
            tracing::info!(
                block = next_instant.block_number(),
                events = applied.len(),
                done,
                "block applied"
            );
        }

        Ok(Some(AppliedBlockEvents::new(self.instant, applied)))
    }

    /// Decodes the raw event by the kind of its emitter and reduces it.
    pub async fn apply_raw_event(
        &mut self,
        instant: types::StateInstant,
        event: &stream::RawEvent,
    ) -> Result<Applied, IndexerError> {
        let Some(kind) = self.watches.watch_kind(event.address()) else {
            return Ok(Applied::Skipped(SkipReason::Unwatched));
        };
        match ProtocolEvents::decode(kind, event.event()) {
            Ok(decoded) => self.apply_event(instant, &event.pass(decoded)).await,
            Err(err) => {
                tracing::debug!(
                    tx = %event.tx_hash(),
                    log_index = event.log_index(),
                    ?kind,
                    %err,
                    "undecodable log"
                );
                Ok(Applied::Skipped(SkipReason::Undecodable))
            }
        }
    }

    /// Reduces a single decoded event observed at the given instant.
    pub async fn apply_event(
        &mut self,
        instant: types::StateInstant,
        event: &EventContext<ProtocolEvents>,
    ) -> Result<Applied, IndexerError> {
        let mut reduction = Reduction::new(&self.store, &self.reader, self.options, instant);
        let applied = reduction.reduce(event).await?;
        let (changes, watches) = reduction.into_parts();
        if applied.is_done() {
            self.store.commit(changes);
            for (address, kind) in watches {
                self.watches.register_watch(address, kind);
            }
        }
        Ok(applied)
    }
}

/// Staged reduction of a single event.
pub(super) struct Reduction<'a, S, R> {
    pub(super) batch: Batch<'a, S>,
    pub(super) reader: &'a R,
    pub(super) options: IndexerOptions,
    pub(super) instant: types::StateInstant,
    watches: Vec<(Address, WatchKind)>,
}

impl<'a, S: Store, R: ContractReader> Reduction<'a, S, R> {
    fn new(
        store: &'a S,
        reader: &'a R,
        options: IndexerOptions,
        instant: types::StateInstant,
    ) -> Self {
        Self {
            batch: Batch::new(store),
            reader,
            options,
            instant,
            watches: vec![],
        }
    }

    fn into_parts(self) -> (Changes, Vec<(Address, WatchKind)>) {
        (self.batch.into_changes(), self.watches)
    }

    /// Requests a subscription, effective once the reduction is committed.
    pub(super) fn watch(&mut self, address: Address, kind: WatchKind) {
        self.watches.push((address, kind));
    }

    /// Block the reads are pinned to.
    pub(super) fn block(&self) -> u64 {
        self.instant.block_number()
    }

    async fn reduce(&mut self, ctx: &EventContext<ProtocolEvents>) -> Result<Applied, IndexerError> {
        match ctx.event() {
            ProtocolEvents::Manager(event) => match event {
                ConfigurationManagerEvents::OwnershipTransferred(e) => {
                    self.ownership_transferred(ctx, e)
                }
                ConfigurationManagerEvents::ModuleSet(e) => self.module_set(ctx, e),
                ConfigurationManagerEvents::ParameterSet(_) => {
                    Ok(Applied::Skipped(SkipReason::Ignored))
                }
            },
            ProtocolEvents::OptionFactory(OptionFactoryEvents::OptionCreated(e)) => {
                self.option_created(ctx, e).await
            }
            ProtocolEvents::PoolFactory(OptionAMMFactoryEvents::PoolCreated(e)) => {
                self.pool_created(ctx, e).await
            }
            ProtocolEvents::Helper(event) => match event {
                OptionHelperEvents::OptionsBought(e) => Ok(self.buy(ctx, e).await),
                OptionHelperEvents::OptionsMintedAndSold(e) => Ok(self.sell(ctx, e).await),
                OptionHelperEvents::OptionsSold(e) => Ok(self.resell(ctx, e).await),
            },
            ProtocolEvents::Option(event) => match event {
                PodOptionEvents::Mint(e) => Ok(self.mint(ctx, e).await),
                PodOptionEvents::Unmint(e) => Ok(self.unmint(ctx, e).await),
                PodOptionEvents::Exercise(e) => Ok(self.exercise(ctx, e).await),
                PodOptionEvents::Withdraw(e) => Ok(self.withdraw(ctx, e).await),
                PodOptionEvents::Transfer(e) => Ok(self.transfer(ctx, e).await),
            },
            ProtocolEvents::Pool(event) => match event {
                OptionAMMPoolEvents::AddLiquidity(e) => Ok(self.add_liquidity(ctx, e).await),
                OptionAMMPoolEvents::RemoveLiquidity(e) => Ok(self.remove_liquidity(ctx, e).await),
                OptionAMMPoolEvents::TradeInfo(e) => Ok(self.trade_info(ctx, e)),
            },
            ProtocolEvents::FeePool(FeePoolEvents::FeeWithdrawn(e)) => Ok(self.fee_withdrawn(ctx, e)),
        }
    }
}
