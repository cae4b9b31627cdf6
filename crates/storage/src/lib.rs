#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-storage: the Persistence Port (C7, spec §4.7) — a write-through
//! shadow of the agent registry and workflow engine, backed by a
//! write-ahead log plus a replayed in-memory materialization, and the
//! periodic reconciler (spec §4.7 "last-writer-wins by timestamp").

pub mod port;
pub mod reconcile;
pub mod state;
pub mod wal;

pub use port::{PersistenceError, PersistencePort};
pub use reconcile::reconcile;
pub use state::{MaterializedState, PersistenceEvent};
pub use wal::{Wal, WalEntry, WalError};
