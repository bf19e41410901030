//! Full-text backend: client contract, adapter and in-memory engine.

pub mod adapter;
pub mod client;
pub mod memory;

pub use self::adapter::{FulltextQueryAdapter, FulltextResultSet};
pub use self::client::{FulltextClient, FulltextDocument, FulltextRequest, FulltextResponse};
pub use self::memory::MemoryFulltextEngine;
