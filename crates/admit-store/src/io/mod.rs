//! Snapshot file I/O.
//!
//! This module handles:
//! - Saving store snapshots with atomic writes
//! - Loading snapshots with format validation
//! - The atomic write shared with the directory object store

mod load;
mod save;

pub use load::{load_snapshot, load_snapshot_async};
pub use save::{save_snapshot, save_snapshot_async};
pub(crate) use save::write_atomic;
