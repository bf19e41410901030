//! The property-filtered scan primitive of the content store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::access::AccessContext;
use crate::error::Result;
use crate::query::decompose::BooleanFilterMap;
use crate::result::property_value::PropertyValue;
use crate::result::search_result::SearchResult;

/// Hint: zero-based page number.
pub const PAGE_HINT: &str = "page";
/// Hint: page size.
pub const ITEMS_HINT: &str = "items";
/// Hint: absolute index of the first item; wins over `page * items`.
pub const OFFSET_HINT: &str = "offset";
/// Hint: comma-separated sort specification.
pub const SORT_HINT: &str = "sort";
/// Hint: named statement set restricting the scan.
pub const STATEMENT_SET_HINT: &str = "statementset";

/// A content object as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub path: String,
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
}

impl ContentItem {
    pub fn new<S: Into<String>>(path: S) -> Self {
        ContentItem {
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Append a value to a property.
    pub fn add_value<S: Into<String>, V: Into<PropertyValue>>(mut self, name: S, value: V) -> Self {
        self.properties.entry(name.into()).or_default().push(value.into());
        self
    }

    /// All values of a property; empty when absent.
    pub fn values(&self, name: &str) -> &[PropertyValue] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_value(&self, name: &str) -> Option<&PropertyValue> {
        self.values(name).first()
    }
}

impl From<ContentItem> for SearchResult {
    fn from(item: ContentItem) -> Self {
        SearchResult::with_properties(item.path, item.properties)
    }
}

/// A lazily resolved scan. Per-item failures are yielded in place so the
/// consumer can skip an item without abandoning the scan.
pub type ContentScan = Box<dyn Iterator<Item = Result<ContentItem>> + Send>;

/// A content store that can scan by property filters.
///
/// Implementations enforce read access themselves: items `access` may not
/// read never appear in a scan.
pub trait ContentStore: Send + Sync {
    /// Start a scan. Paging and sort arrive as `_`-prefixed hints in `filters`.
    fn find(&self, access: &AccessContext, filters: &BooleanFilterMap) -> Result<ContentScan>;
}
