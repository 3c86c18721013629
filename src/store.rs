//! Entity store seam.
//!
//! Reducers address rows by [`EntityKind`] and string identifier only.
//! [`MemoryStore`] keeps everything ordered in memory, [`Batch`] stages the
//! writes of a single event on top of any store so they can be committed
//! or dropped as a whole.

use std::collections::BTreeMap;

use crate::state::{
    Action, Configuration, Fee, FeePool, Manager, Metadata, OptionActivity, OptionFactory,
    OptionHelper, OptionSeries, Pool, PoolFactory, Position, SpotPrice, User,
};

/// Record with a typed identity in the store.
pub trait Entity: Clone + Sized {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> Option<Self>;
}

macro_rules! entities {
    ($($kind:ident => $entity:ty),* $(,)?) => {
        /// Type of the stored entity.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum EntityKind {
            $($kind),*
        }

        /// Any stored entity.
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub enum Record {
            $($kind($entity)),*
        }

        impl Record {
            pub fn kind(&self) -> EntityKind {
                match self {
                    $(Record::$kind(_) => EntityKind::$kind),*
                }
            }

            pub fn id(&self) -> &str {
                match self {
                    $(Record::$kind(e) => &e.id),*
                }
            }
        }

        $(
            impl Entity for $entity {
                const KIND: EntityKind = EntityKind::$kind;

                fn id(&self) -> &str {
                    &self.id
                }

                fn into_record(self) -> Record {
                    Record::$kind(self)
                }

                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$kind(e) => Some(e),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*
    };
}

entities! {
    Manager => Manager,
    Configuration => Configuration,
    OptionFactory => OptionFactory,
    OptionHelper => OptionHelper,
    PoolFactory => PoolFactory,
    Option => OptionSeries,
    Pool => Pool,
    FeePool => FeePool,
    User => User,
    Position => Position,
    Action => Action,
    Metadata => Metadata,
    Fee => Fee,
    SpotPrice => SpotPrice,
    Activity => OptionActivity,
}

type Key = (EntityKind, String);

/// Key-value store of entities.
///
/// Effects of a write are visible to the next load.
pub trait Store {
    fn load_record(&self, kind: EntityKind, id: &str) -> Option<Record>;

    /// Inserts the record or fully replaces the existing one.
    fn upsert_record(&mut self, record: Record);

    /// Returns `true` if the record existed.
    fn delete_record(&mut self, kind: EntityKind, id: &str) -> bool;

    /// Applies the staged changes of a [`Batch`].
    fn commit(&mut self, changes: Changes) {
        for ((kind, id), change) in changes.0 {
            match change {
                Some(record) => self.upsert_record(record),
                None => {
                    self.delete_record(kind, &id);
                }
            }
        }
    }
}

/// Typed access on top of any [`Store`].
pub trait StoreExt: Store {
    fn load<E: Entity>(&self, id: &str) -> Option<E> {
        self.load_record(E::KIND, id).and_then(E::from_record)
    }

    fn contains<E: Entity>(&self, id: &str) -> bool {
        self.load_record(E::KIND, id).is_some()
    }

    fn upsert<E: Entity>(&mut self, entity: E) {
        self.upsert_record(entity.into_record());
    }

    fn delete<E: Entity>(&mut self, id: &str) -> bool {
        self.delete_record(E::KIND, id)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Ordered in-memory store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    records: BTreeMap<Key, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All entities of a type in identifier order.
    pub fn iter<E: Entity>(&self) -> impl Iterator<Item = E> + '_ {
        self.records
            .range((E::KIND, String::new())..)
            .take_while(|((kind, _), _)| *kind == E::KIND)
            .filter_map(|(_, record)| E::from_record(record.clone()))
    }

    /// Number of stored entities of a type.
    pub fn count<E: Entity>(&self) -> usize {
        self.iter::<E>().count()
    }
}

impl Store for MemoryStore {
    fn load_record(&self, kind: EntityKind, id: &str) -> Option<Record> {
        self.records.get(&(kind, id.to_string())).cloned()
    }

    fn upsert_record(&mut self, record: Record) {
        self.records
            .insert((record.kind(), record.id().to_string()), record);
    }

    fn delete_record(&mut self, kind: EntityKind, id: &str) -> bool {
        self.records.remove(&(kind, id.to_string())).is_some()
    }
}

/// Writes staged by a [`Batch`], `None` marking a deletion.
#[derive(Debug, Default)]
pub struct Changes(BTreeMap<Key, Option<Record>>);

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Write overlay reading through to the underlying store.
#[derive(Debug)]
pub struct Batch<'s, S> {
    base: &'s S,
    changes: BTreeMap<Key, Option<Record>>,
}

impl<'s, S: Store> Batch<'s, S> {
    pub fn new(base: &'s S) -> Self {
        Self {
            base,
            changes: BTreeMap::new(),
        }
    }

    pub fn into_changes(self) -> Changes {
        Changes(self.changes)
    }
}

impl<S: Store> Store for Batch<'_, S> {
    fn load_record(&self, kind: EntityKind, id: &str) -> Option<Record> {
        match self.changes.get(&(kind, id.to_string())) {
            Some(staged) => staged.clone(),
            None => self.base.load_record(kind, id),
        }
    }

    fn upsert_record(&mut self, record: Record) {
        self.changes
            .insert((record.kind(), record.id().to_string()), Some(record));
    }

    fn delete_record(&mut self, kind: EntityKind, id: &str) -> bool {
        let existed = self.load_record(kind, id).is_some();
        self.changes.insert((kind, id.to_string()), None);
        existed
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    fn user(hex: &str) -> User {
        User {
            id: hex.to_string(),
            address: address!("0x00000000000000000000000000000000000000aa"),
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load::<User>("0xaa").is_none());

        store.upsert(user("0xaa"));
        store.upsert(user("0xbb"));
        assert_eq!(store.load::<User>("0xaa"), Some(user("0xaa")));
        assert!(store.load::<Pool>("0xaa").is_none());
        assert_eq!(store.count::<User>(), 2);

        assert!(store.delete::<User>("0xaa"));
        assert!(!store.delete::<User>("0xaa"));
        assert_eq!(store.iter::<User>().map(|u| u.id).collect::<Vec<_>>(), vec!["0xbb"]);
    }

    #[test]
    fn test_batch_overlay() {
        let mut store = MemoryStore::new();
        store.upsert(user("0xaa"));

        let mut batch = Batch::new(&store);
        batch.upsert(user("0xbb"));
        assert!(batch.delete::<User>("0xaa"));
        assert!(batch.load::<User>("0xaa").is_none());
        assert!(batch.contains::<User>("0xbb"));
        assert!(!batch.delete::<User>("0xcc"));

        // Base untouched until commit
        assert!(store.contains::<User>("0xaa"));
        assert!(!store.contains::<User>("0xbb"));

        let changes = batch.into_changes();
        assert_eq!(changes.len(), 3);
        store.commit(changes);
        assert!(!store.contains::<User>("0xaa"));
        assert!(store.contains::<User>("0xbb"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dropped_batch_leaves_store_unchanged() {
        let mut store = MemoryStore::new();
        store.upsert(user("0xaa"));
        let before = store.clone();

        let mut batch = Batch::new(&store);
        batch.upsert(user("0xbb"));
        drop(batch);

        assert_eq!(store, before);
    }
}
