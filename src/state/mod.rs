//! Indexed protocol state and the event reducers maintaining it.
//!
//! [`Indexer`] is the single entry point: it takes events strictly in chain
//! order, from [`crate::stream::raw`] via [`Indexer::apply_events`] or already
//! decoded via [`Indexer::apply_event`], and reduces each of them into
//! the entities below.
//!
//! Entities reference each other by string identifiers derived in
//! [`crate::ids`], a reference is `None` until the referenced entity has been
//! observed. Reducers cross the [`crate::store::Store`] boundary for every
//! read and write, so the indexer keeps no state of its own apart from the
//! last applied [`crate::types::StateInstant`].

mod action;
mod activity;
mod actions;
mod auxiliary;
mod configuration;
mod event;
mod indexer;
mod manager;
mod metadata;
mod option;
mod pool;
mod position;
mod registry;
mod tracker;

// Public re-exports
pub use action::*;
pub use activity::*;
pub use event::*;
pub use indexer::*;
pub use manager::*;
pub use metadata::*;
pub use option::*;
pub use pool::*;
pub use position::*;
