//! # Trawl
//!
//! Query resolution and pagination in front of two search backends.
//!
//! ## Features
//!
//! - Routing of resolved queries to a full-text engine or a property-filtered
//!   content store
//! - Reader-list access filtering for the full-text engine
//! - Boolean query decomposition into AND/OR store filters
//! - Bounded counting and total estimation for backends that cannot count
//! - Slow query logging
//! - In-memory reference backends

pub mod access;
pub mod config;
pub mod error;
pub mod fulltext;
pub mod monitor;
pub mod query;
pub mod result;
pub mod router;
pub mod store;

pub mod prelude {
    pub use crate::access::AccessContext;
    pub use crate::config::EngineConfig;
    pub use crate::error::{Result, TrawlError};
    pub use crate::fulltext::{FulltextClient, FulltextQueryAdapter, MemoryFulltextEngine};
    pub use crate::query::{PageRequest, Query, QueryTemplate};
    pub use crate::result::{ResultSet, SearchResult};
    pub use crate::router::{QueryRouter, ResultSetFactory};
    pub use crate::store::{ContentStore, DirectStoreQueryAdapter, MemoryContentStore};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
