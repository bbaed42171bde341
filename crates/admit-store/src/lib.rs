//! Storage seams for the admissions core.
//!
//! The hosted relational store and the blob store are external collaborators.
//! This crate describes them as traits and ships in-memory implementations
//! used by the tests and the command-line front end.
//!
//! # Architecture
//!
//! - `table.rs` - tables, rows and equality filters
//! - `gateway.rs` - the `PersistenceGateway` trait
//! - `typed.rs` - typed decode/encode helpers over raw rows
//! - `object_store.rs` - the `ObjectStore` trait
//! - `effect.rs` - detached best-effort effects
//! - `memory/` - in-memory implementations with fault injection
//! - `directory.rs` - an object store over a local directory
//! - `io/` - JSON snapshot load/save with atomic writes
//! - `error.rs` - error types with user-friendly messages

mod directory;
mod effect;
mod error;
mod gateway;
mod io;
mod memory;
mod object_store;
mod table;
mod typed;

pub use directory::DirectoryObjectStore;
pub use effect::{BackgroundEffect, EffectWarning};
pub use error::{GatewayError, Result};
pub use gateway::PersistenceGateway;
pub use io::{load_snapshot, load_snapshot_async, save_snapshot, save_snapshot_async};
pub use memory::{MemoryGateway, MemoryObjectStore, StoreSnapshot};
pub use object_store::{ObjectStore, TransformRequest, sanitize_object_name};
pub use table::{Condition, Filter, Operation, Row, Table};
pub use typed::{decode_row, encode_row, fetch_all, fetch_one, insert_record};
