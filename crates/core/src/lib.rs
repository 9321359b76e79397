//! Routinely core: daily routine resolution and completion statistics.
//!
//! Everything in this crate is a pure function of a caller-supplied
//! [`routine::Snapshot`]. No I/O, no locks, no storage dependencies, so the
//! same engine serves any backing store and can be called in parallel for
//! different users or ranges.

pub mod calendar;
pub mod completion_index;
pub mod daily;
pub mod error;
pub mod routine;
pub mod schedule;
pub mod stats;
pub mod types;
