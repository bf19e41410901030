//! Direct content-store backend: scan contract, adapter and in-memory store.

pub mod adapter;
pub mod client;
pub mod memory;

pub use self::adapter::{DirectStoreQueryAdapter, StoreResultSet, estimate_total};
pub use self::client::{ContentItem, ContentScan, ContentStore};
pub use self::memory::MemoryContentStore;
