//! Data access for the routine engine.
//!
//! The engine itself is pure; this crate supplies the per-user
//! [`Snapshot`](routinely_core::routine::Snapshot)s it runs over. The only
//! provider shipped here is [`MemoryStore`], which can be seeded from a JSON
//! fixture file.

pub mod error;
pub mod memory;
pub mod seed;
pub mod source;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use seed::SeedData;
pub use source::{MarkOutcome, RoutineStore, ScheduledRoutine, SnapshotSource};
