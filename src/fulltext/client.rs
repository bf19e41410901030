//! The contract a full-text engine client fulfils.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::sort::SortSpec;
use crate::result::property_value::PropertyValue;

/// A structured full-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulltextRequest {
    /// Main query text.
    pub query: String,
    /// Index of the first row to return.
    pub start: u64,
    /// Maximum number of rows to return.
    pub rows: u64,
    /// Sort keys, most significant first. Empty means engine relevance order.
    pub sort: Vec<SortSpec>,
    /// Filter queries; every one must match, none affect scoring.
    pub filter_queries: Vec<String>,
    /// Engine-specific parameters passed through verbatim.
    pub params: BTreeMap<String, String>,
}

/// One stored document as returned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulltextDocument {
    pub id: String,
    pub fields: BTreeMap<String, Vec<PropertyValue>>,
}

impl FulltextDocument {
    pub fn new<S: Into<String>>(id: S) -> Self {
        FulltextDocument {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Append a value to a field.
    pub fn add_value<S: Into<String>, V: Into<PropertyValue>>(mut self, name: S, value: V) -> Self {
        self.fields.entry(name.into()).or_default().push(value.into());
        self
    }

    /// First value of a field.
    pub fn first_value(&self, name: &str) -> Option<&PropertyValue> {
        self.fields.get(name).and_then(|values| values.first())
    }
}

/// One page of rows plus the exact number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulltextResponse {
    pub documents: Vec<FulltextDocument>,
    pub num_found: u64,
}

/// A full-text engine connection.
///
/// Implementations are expected to be thread-safe pooled clients; transport
/// failures are reported as [`crate::error::TrawlError::BackendUnavailable`].
pub trait FulltextClient: Send + Sync {
    /// Run one query.
    fn search(&self, request: &FulltextRequest) -> Result<FulltextResponse>;
}
