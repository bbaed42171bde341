//! In-memory implementations of the storage seams.
//!
//! Provides:
//! - `MemoryGateway` - row store with fault injection and a write gate
//! - `MemoryObjectStore` - blob store that records transform calls

mod gateway;
mod object_store;

pub use gateway::{MemoryGateway, StoreSnapshot};
pub use object_store::MemoryObjectStore;
