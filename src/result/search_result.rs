//! Result items and per-item outcomes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::TrawlError;
use crate::result::property_value::PropertyValue;

/// One result row: an item path plus multi-valued properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    path: String,
    properties: BTreeMap<String, Vec<PropertyValue>>,
}

impl SearchResult {
    /// Create a result without properties.
    pub fn new<S: Into<String>>(path: S) -> Self {
        SearchResult {
            path: path.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Create a result from a full property map.
    pub fn with_properties<S: Into<String>>(
        path: S,
        properties: BTreeMap<String, Vec<PropertyValue>>,
    ) -> Self {
        SearchResult {
            path: path.into(),
            properties,
        }
    }

    /// Append a value to a property.
    pub fn add_value<S: Into<String>, V: Into<PropertyValue>>(mut self, name: S, value: V) -> Self {
        self.properties
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Get the item path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get every property.
    pub fn properties(&self) -> &BTreeMap<String, Vec<PropertyValue>> {
        &self.properties
    }

    /// All values of one property; empty when absent.
    pub fn values(&self, name: &str) -> &[PropertyValue] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of one property.
    pub fn first_value(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name).and_then(|values| values.first())
    }
}

/// An item that could not be turned into a result.
#[derive(Debug)]
pub struct SkippedItem {
    /// Path of the item, when the backend reported one.
    pub path: Option<String>,
    /// Why the item was skipped.
    pub error: TrawlError,
}

impl SkippedItem {
    pub fn new(path: Option<String>, error: TrawlError) -> Self {
        SkippedItem { path, error }
    }
}

/// What iterating a result set produces for one item.
#[derive(Debug)]
pub enum ItemOutcome {
    Found(SearchResult),
    Skipped(SkippedItem),
}

impl ItemOutcome {
    /// The result, if the item was found.
    pub fn found(self) -> Option<SearchResult> {
        match self {
            ItemOutcome::Found(result) => Some(result),
            ItemOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemOutcome::Skipped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let result = SearchResult::new("/content/a")
            .add_value("tag", "x")
            .add_value("tag", "y")
            .add_value("size", 12i64);

        assert_eq!(result.path(), "/content/a");
        assert_eq!(result.first_value("tag"), Some(&PropertyValue::from("x")));
        assert_eq!(result.values("tag").len(), 2);
        assert_eq!(result.first_value("missing"), None);
        assert!(result.values("missing").is_empty());
    }

    #[test]
    fn test_outcome() {
        let found = ItemOutcome::Found(SearchResult::new("/a"));
        assert!(!found.is_skipped());
        assert_eq!(found.found().unwrap().path(), "/a");

        let skipped = ItemOutcome::Skipped(SkippedItem::new(
            Some("/b".to_string()),
            TrawlError::access_denied("/b"),
        ));
        assert!(skipped.is_skipped());
        assert!(skipped.found().is_none());
    }
}
