//! Dynamic subscriptions to contracts discovered while indexing.

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::{
    state::{FeePool, OptionFactory, OptionHelper, OptionSeries, Pool, PoolFactory},
    store::MemoryStore,
};

/// Event schema a watched contract emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchKind {
    Manager,
    OptionFactory,
    OptionHelper,
    PoolFactory,
    Option,
    Pool,
    FeePool,
}

/// Registry of contract addresses whose events are reduced.
pub trait Subscriptions {
    /// Starts watching the address, replacing any previous kind.
    fn register_watch(&mut self, address: Address, kind: WatchKind);

    fn watch_kind(&self, address: Address) -> Option<WatchKind>;
}

/// In-memory [`Subscriptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Watchlist {
    watches: HashMap<Address, WatchKind>,
}

impl Watchlist {
    /// Watchlist following only the configuration manager.
    pub fn new(configuration_manager: Address) -> Self {
        let mut watchlist = Self::default();
        watchlist.register_watch(configuration_manager, WatchKind::Manager);
        watchlist
    }

    /// Rebuilds the watchlist from the contracts already indexed in the store.
    pub fn from_store(store: &MemoryStore, configuration_manager: Address) -> Self {
        let mut watchlist = Self::new(configuration_manager);
        store
            .iter::<OptionFactory>()
            .for_each(|m| watchlist.register_watch(m.address, WatchKind::OptionFactory));
        store
            .iter::<OptionHelper>()
            .for_each(|m| watchlist.register_watch(m.address, WatchKind::OptionHelper));
        store
            .iter::<PoolFactory>()
            .for_each(|m| watchlist.register_watch(m.address, WatchKind::PoolFactory));
        store
            .iter::<OptionSeries>()
            .for_each(|o| watchlist.register_watch(o.address, WatchKind::Option));
        store
            .iter::<Pool>()
            .for_each(|p| watchlist.register_watch(p.address, WatchKind::Pool));
        store
            .iter::<FeePool>()
            .for_each(|p| watchlist.register_watch(p.address, WatchKind::FeePool));
        watchlist
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Watched addresses of the given kind, in no particular order.
    pub fn addresses(&self, kind: WatchKind) -> impl Iterator<Item = Address> + '_ {
        self.watches
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(address, _)| *address)
    }
}

impl Subscriptions for Watchlist {
    fn register_watch(&mut self, address: Address, kind: WatchKind) {
        if self.watches.insert(address, kind).is_none() {
            tracing::debug!(%address, ?kind, "watching contract");
        }
    }

    fn watch_kind(&self, address: Address) -> Option<WatchKind> {
        self.watches.get(&address).copied()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let manager = address!("0x00000000000000000000000000000000000000a1");
        let pool = address!("0x00000000000000000000000000000000000000b2");
        let mut watchlist = Watchlist::new(manager);

        assert_eq!(watchlist.watch_kind(manager), Some(WatchKind::Manager));
        assert_eq!(watchlist.watch_kind(pool), None);

        watchlist.register_watch(pool, WatchKind::Pool);
        watchlist.register_watch(pool, WatchKind::Pool);
        assert_eq!(watchlist.len(), 2);
        assert_eq!(watchlist.addresses(WatchKind::Pool).collect::<Vec<_>>(), vec![pool]);
    }
}
