//! The resolved query value handed to a backend adapter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Option keys starting with this prefix belong to the engine.
///
/// Callers never control them; [`Query::merge_user_options`] drops them.
pub const RESERVED_PREFIX: &str = "_";

/// Backend token of the full-text adapter.
pub const FULLTEXT_BACKEND: &str = "fulltext";

/// Backend token of the direct-store adapter.
pub const DIRECT_STORE_BACKEND: &str = "store";

/// Returns true if `key` lives in the engine's reserved key space.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// A resolved query: backend-specific query text plus options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    query_string: String,
    options: BTreeMap<String, String>,
    name: Option<String>,
    query_type: String,
}

impl Query {
    /// Create a full-text query with no options.
    pub fn new<S: Into<String>>(query_string: S) -> Self {
        Query {
            query_string: query_string.into(),
            options: BTreeMap::new(),
            name: None,
            query_type: FULLTEXT_BACKEND.to_string(),
        }
    }

    /// Start building a query.
    pub fn builder<S: Into<String>>(query_string: S) -> QueryBuilder {
        QueryBuilder {
            query: Query::new(query_string),
        }
    }

    /// Get the query text.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Get the options.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Look up one option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Get the named statement set, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the declared backend type.
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    /// Return a copy with user parameters merged into the non-reserved keys.
    ///
    /// Later values overwrite earlier ones; reserved keys are dropped.
    pub fn merge_user_options<I, K, V>(&self, params: I) -> Query
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = self.clone();
        for (key, value) in params {
            let key = key.into();
            if is_reserved_key(&key) {
                debug!(key = %key, "dropping reserved user option");
                continue;
            }
            merged.options.insert(key, value.into());
        }
        merged
    }

    /// Return a copy carrying different options.
    pub(crate) fn with_options(&self, options: BTreeMap<String, String>) -> Query {
        Query {
            options,
            ..self.clone()
        }
    }

    /// Return a copy carrying a different declared type.
    pub(crate) fn with_query_type(&self, query_type: String) -> Query {
        Query {
            query_type,
            ..self.clone()
        }
    }
}

/// Builder for [`Query`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Set one option.
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.options.insert(key.into(), value.into());
        self
    }

    /// Set all options at once.
    pub fn options(mut self, options: BTreeMap<String, String>) -> Self {
        self.query.options = options;
        self
    }

    /// Select a named statement set.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.query.name = Some(name.into());
        self
    }

    /// Set the declared backend type.
    pub fn query_type<S: Into<String>>(mut self, query_type: S) -> Self {
        self.query.query_type = query_type.into();
        self
    }

    /// Build the query.
    pub fn build(self) -> Query {
        self.query
    }
}
