//! Dispatch of queries to the adapter registered for their backend type.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, info};

use crate::access::AccessContext;
use crate::error::{Result, TrawlError};
use crate::query::page::PageRequest;
use crate::query::search_query::Query;
use crate::result::result_set::ResultSet;

/// Anything that can execute a query for one backend.
pub trait ResultSetFactory: Send + Sync {
    /// Run `query` for one page on behalf of `access`.
    fn execute(
        &self,
        query: &Query,
        page: &PageRequest,
        access: &AccessContext,
    ) -> Result<Box<dyn ResultSet>>;
}

/// Exact-match registry from backend token to adapter.
#[derive(Default)]
pub struct QueryRouter {
    adapters: AHashMap<String, Arc<dyn ResultSetFactory>>,
}

fn normalize_type(query_type: &str) -> String {
    query_type.trim().to_lowercase()
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under `backend`, replacing any previous one.
    pub fn register<S: AsRef<str>>(&mut self, backend: S, adapter: Arc<dyn ResultSetFactory>) {
        let backend = normalize_type(backend.as_ref());
        info!(backend = %backend, "registered query adapter");
        self.adapters.insert(backend, adapter);
    }

    /// Builder-style [`QueryRouter::register`].
    pub fn with_adapter<S: AsRef<str>>(
        mut self,
        backend: S,
        adapter: Arc<dyn ResultSetFactory>,
    ) -> Self {
        self.register(backend, adapter);
        self
    }

    /// Registered backend tokens, sorted.
    pub fn backends(&self) -> Vec<&str> {
        let mut backends: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        backends.sort_unstable();
        backends
    }

    /// Look up the adapter for a backend token.
    pub fn resolve(&self, query_type: &str) -> Result<Arc<dyn ResultSetFactory>> {
        let backend = normalize_type(query_type);
        self.adapters
            .get(&backend)
            .cloned()
            .ok_or_else(|| TrawlError::unknown_backend(backend))
    }

    /// Normalize `query` and run it on its declared backend.
    pub fn execute(
        &self,
        query: &Query,
        page: &PageRequest,
        access: &AccessContext,
    ) -> Result<Box<dyn ResultSet>> {
        let adapter = self.resolve(query.query_type())?;
        let query = normalize(query);
        debug!(
            backend = query.query_type(),
            page = page.page(),
            items = page.items_per_page(),
            "dispatching query"
        );
        adapter.execute(&query, page, access)
    }
}

/// Trimmed type and options; options with blank values are dropped.
fn normalize(query: &Query) -> Query {
    let options: BTreeMap<String, String> = query
        .options()
        .iter()
        .filter_map(|(key, value)| {
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect();

    query
        .with_options(options)
        .with_query_type(normalize_type(query.query_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::result_set::VecResultSet;
    use crate::result::search_result::SearchResult;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingFactory {
        seen: Mutex<Vec<Query>>,
    }

    impl ResultSetFactory for RecordingFactory {
        fn execute(
            &self,
            query: &Query,
            _page: &PageRequest,
            _access: &AccessContext,
        ) -> Result<Box<dyn ResultSet>> {
            self.seen.lock().push(query.clone());
            Ok(Box::new(VecResultSet::from_results(vec![SearchResult::new("/x")])))
        }
    }

    #[test]
    fn test_dispatch_normalizes_query() {
        let factory = Arc::new(RecordingFactory::default());
        let router = QueryRouter::new().with_adapter("store", factory.clone());

        let query = Query::builder("a:1")
            .query_type("  Store ")
            .option(" sort ", " rank desc ")
            .option("empty", "   ")
            .build();
        let mut results = router
            .execute(&query, &PageRequest::default(), &AccessContext::anonymous("anonymous"))
            .unwrap();
        assert_eq!(results.size(), 1);
        assert_eq!(results.results().count(), 1);

        let seen = factory.seen.lock();
        assert_eq!(seen[0].query_type(), "store");
        assert_eq!(seen[0].option("sort"), Some("rank desc"));
        assert_eq!(seen[0].option("empty"), None);
    }

    #[test]
    fn test_unknown_backend() {
        let router = QueryRouter::new().with_adapter("fulltext", Arc::new(RecordingFactory::default()));
        let query = Query::builder("a:1").query_type("graph").build();
        let err = router
            .execute(&query, &PageRequest::default(), &AccessContext::anonymous("anonymous"))
            .err()
            .unwrap();
        assert!(matches!(err, TrawlError::UnknownBackendType(ref b) if b == "graph"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_backends_listing() {
        let router = QueryRouter::new()
            .with_adapter("store", Arc::new(RecordingFactory::default()))
            .with_adapter("FullText", Arc::new(RecordingFactory::default()));
        assert_eq!(router.backends(), vec!["fulltext", "store"]);
        assert!(router.resolve("STORE").is_ok());
    }
}
