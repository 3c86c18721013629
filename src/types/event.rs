use alloy::primitives::{Address, TxHash};

use crate::ids;

/// Events from a specific block.
#[derive(Debug)]
pub struct BlockEvents<T> {
    instant: super::StateInstant,
    events: Vec<T>,
}

/// Event along with transaction context.
#[derive(Clone, Debug)]
pub struct EventContext<T> {
    pub(crate) tx_hash: TxHash,
    pub(crate) tx_from: Address,
    pub(crate) tx_index: u64,
    pub(crate) log_index: u64,
    pub(crate) address: Address,
    pub(crate) event: T,
}

impl<T> BlockEvents<T> {
    pub fn new(instant: super::StateInstant, events: Vec<T>) -> Self {
        Self { instant, events }
    }

    /// Instant the events produced at.
    pub fn instant(&self) -> super::StateInstant {
        self.instant
    }

    /// Events in emission order.
    pub fn events(&self) -> &[T] {
        &self.events
    }
}

impl<T> EventContext<T> {
    pub fn new(
        tx_hash: TxHash,
        tx_from: Address,
        tx_index: u64,
        log_index: u64,
        address: Address,
        event: T,
    ) -> Self {
        Self {
            tx_hash,
            tx_from,
            tx_index,
            log_index,
            address,
            event,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Sender of the transaction.
    pub fn tx_from(&self) -> Address {
        self.tx_from
    }

    pub fn tx_index(&self) -> u64 {
        self.tx_index
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    /// Contract that emitted the event.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn event(&self) -> &T {
        &self.event
    }

    /// Transaction hash in its identifier form.
    pub fn tx_id(&self) -> String {
        ids::tx_id(self.tx_hash)
    }

    pub(crate) fn pass<O>(&self, other: O) -> EventContext<O> {
        EventContext {
            tx_hash: self.tx_hash,
            tx_from: self.tx_from,
            tx_index: self.tx_index,
            log_index: self.log_index,
            address: self.address,
            event: other,
        }
    }
}
