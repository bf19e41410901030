//! Executes queries against the full-text engine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::vec;

use tracing::debug;

use crate::access::AccessContext;
use crate::config::EngineConfig;
use crate::error::{Result, TrawlError};
use crate::fulltext::client::{FulltextClient, FulltextDocument, FulltextRequest};
use crate::monitor::SlowQueryMonitor;
use crate::query::page::PageRequest;
use crate::query::search_query::{FULLTEXT_BACKEND, Query, is_reserved_key};
use crate::query::sort::SortSpec;
use crate::query::term::escape_term;
use crate::result::result_set::{ResultSet, Results};
use crate::result::search_result::{ItemOutcome, SearchResult};
use crate::router::ResultSetFactory;

/// Option holding the sort specification.
pub const SORT_OPTION: &str = "sort";

/// Prefix of per-field boost options, e.g. `boost.title = 2.0`.
pub const BOOST_OPTION_PREFIX: &str = "boost.";

/// Engine parameter receiving the rendered boosts.
pub const BOOST_PARAM: &str = "qf";

/// Result set over one page of engine rows.
///
/// The size is the engine's exact total, never an estimate.
pub struct FulltextResultSet {
    rows: Option<vec::IntoIter<FulltextDocument>>,
    num_found: i64,
    path_field: String,
}

impl FulltextResultSet {
    pub fn new(documents: Vec<FulltextDocument>, num_found: u64, path_field: String) -> Self {
        FulltextResultSet {
            rows: Some(documents.into_iter()),
            num_found: i64::try_from(num_found).unwrap_or(i64::MAX),
            path_field,
        }
    }
}

fn to_result(document: FulltextDocument, path_field: &str) -> SearchResult {
    let path = document
        .first_value(path_field)
        .map(|value| value.to_term_string())
        .unwrap_or_else(|| document.id.clone());
    SearchResult::with_properties(path, document.fields)
}

impl ResultSet for FulltextResultSet {
    fn results(&mut self) -> Results {
        match self.rows.take() {
            Some(rows) => {
                let path_field = self.path_field.clone();
                Results::new(rows.map(move |doc| ItemOutcome::Found(to_result(doc, &path_field))))
            }
            None => Results::empty(),
        }
    }

    fn size(&self) -> i64 {
        self.num_found
    }
}

/// Adapter for the full-text backend.
///
/// Narrows every query to the items the caller may read, unless the caller
/// is the admin principal.
pub struct FulltextQueryAdapter {
    client: Arc<dyn FulltextClient>,
    config: Arc<EngineConfig>,
    monitor: SlowQueryMonitor,
}

impl FulltextQueryAdapter {
    pub fn new(client: Arc<dyn FulltextClient>, config: Arc<EngineConfig>) -> Self {
        let monitor = SlowQueryMonitor::from_config(&config);
        FulltextQueryAdapter {
            client,
            config,
            monitor,
        }
    }

    /// Reader filter for the caller, or `None` for the admin principal.
    pub fn reader_filter(&self, access: &AccessContext) -> Option<String> {
        let readers = &self.config.readers_field;

        if access.is_anonymous() {
            return Some(format!(
                "{readers}:{}",
                escape_term(&self.config.anonymous_principal)
            ));
        }
        if access.is_admin(&self.config.admin_principal) {
            return None;
        }

        let principals: Vec<String> = std::iter::once(access.user_id())
            .chain(access.group_ids().iter().map(String::as_str))
            .filter(|p| *p != self.config.everyone_principal)
            .map(escape_term)
            .collect();
        Some(format!("{readers}:({})", principals.join(" OR ")))
    }

    /// Build the engine request for a query, page and caller.
    pub fn build_request(
        &self,
        query: &Query,
        page: &PageRequest,
        access: &AccessContext,
    ) -> Result<FulltextRequest> {
        let text = query.query_string().trim();
        let mut request = FulltextRequest {
            query: if text.is_empty() { "*:*".to_string() } else { text.to_string() },
            start: page.offset(),
            rows: page.items_per_page(),
            ..Default::default()
        };

        let mut boosts = Vec::new();
        for (key, value) in query.options() {
            if is_reserved_key(key) {
                continue;
            }
            if key == SORT_OPTION {
                request.sort = SortSpec::parse_list(value)?;
            } else if let Some(field) = key.strip_prefix(BOOST_OPTION_PREFIX) {
                let boost: f32 = value.trim().parse().map_err(|_| {
                    TrawlError::invalid_argument(format!("boost for '{field}' is not a number: {value}"))
                })?;
                boosts.push(format!("{field}^{boost}"));
            } else {
                request.params.insert(key.clone(), value.clone());
            }
        }
        if !boosts.is_empty() {
            request.params.insert(BOOST_PARAM.to_string(), boosts.join(" "));
        }

        if let Some(filter) = self.reader_filter(access) {
            request.filter_queries.push(filter);
        }

        Ok(request)
    }
}

impl ResultSetFactory for FulltextQueryAdapter {
    fn execute(
        &self,
        query: &Query,
        page: &PageRequest,
        access: &AccessContext,
    ) -> Result<Box<dyn ResultSet>> {
        let request = self.build_request(query, page, access)?;
        debug!(request = ?describe_request(&request), "full-text request");
        let response = self.monitor.time(FULLTEXT_BACKEND, &request.query, || {
            self.client.search(&request)
        })?;

        Ok(Box::new(FulltextResultSet::new(
            response.documents,
            response.num_found,
            self.config.path_field.clone(),
        )))
    }
}

/// Parameters as ordered key/value pairs, for the request log line.
fn describe_request(request: &FulltextRequest) -> BTreeMap<&'static str, String> {
    let mut description = BTreeMap::new();
    description.insert("q", request.query.clone());
    description.insert("start", request.start.to_string());
    description.insert("rows", request.rows.to_string());
    if !request.sort.is_empty() {
        let sort: Vec<String> = request.sort.iter().map(ToString::to_string).collect();
        description.insert("sort", sort.join(","));
    }
    if !request.filter_queries.is_empty() {
        description.insert("fq", request.filter_queries.join(" AND "));
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulltext::client::FulltextResponse;
    use crate::query::sort::SortOrder;

    struct StaticClient;

    impl FulltextClient for StaticClient {
        fn search(&self, _request: &FulltextRequest) -> Result<FulltextResponse> {
            Ok(FulltextResponse {
                documents: vec![
                    FulltextDocument::new("1").add_value("path", "/a"),
                    FulltextDocument::new("2"),
                ],
                num_found: 57,
            })
        }
    }

    struct FailingClient;

    impl FulltextClient for FailingClient {
        fn search(&self, _request: &FulltextRequest) -> Result<FulltextResponse> {
            Err(TrawlError::backend("connection refused"))
        }
    }

    fn adapter(client: Arc<dyn FulltextClient>) -> FulltextQueryAdapter {
        FulltextQueryAdapter::new(client, Arc::new(EngineConfig::default()))
    }

    #[test]
    fn test_reader_filter_anonymous() {
        let adapter = adapter(Arc::new(StaticClient));
        let filter = adapter.reader_filter(&AccessContext::anonymous("anonymous"));
        assert_eq!(filter.as_deref(), Some("readers:anonymous"));
    }

    #[test]
    fn test_reader_filter_authenticated() {
        let adapter = adapter(Arc::new(StaticClient));
        let access = AccessContext::new("alice", ["staff", "g-1", "everyone"]);
        assert_eq!(
            adapter.reader_filter(&access).as_deref(),
            Some("readers:(alice OR staff OR g\\-1)")
        );
    }

    #[test]
    fn test_reader_filter_admin_bypass() {
        let adapter = adapter(Arc::new(StaticClient));
        assert_eq!(adapter.reader_filter(&AccessContext::new("admin", ["g"])), None);
    }

    #[test]
    fn test_build_request() {
        let adapter = adapter(Arc::new(StaticClient));
        let query = Query::builder("title:rust")
            .option("sort", "created d")
            .option("boost.title", "2")
            .option("defType", "edismax")
            .option("_internal", "x")
            .build();
        let page = PageRequest::new(3, 20).unwrap();

        let request = adapter
            .build_request(&query, &page, &AccessContext::new("admin", Vec::<String>::new()))
            .unwrap();

        assert_eq!(request.query, "title:rust");
        assert_eq!(request.start, 60);
        assert_eq!(request.rows, 20);
        assert_eq!(request.sort, vec![SortSpec::new("created", SortOrder::Desc)]);
        assert_eq!(request.params.get("qf").map(String::as_str), Some("title^2"));
        assert_eq!(request.params.get("defType").map(String::as_str), Some("edismax"));
        assert!(!request.params.contains_key("_internal"));
        assert!(request.filter_queries.is_empty());
    }

    #[test]
    fn test_empty_query_matches_all() {
        let adapter = adapter(Arc::new(StaticClient));
        let request = adapter
            .build_request(
                &Query::new("  "),
                &PageRequest::default(),
                &AccessContext::anonymous("anonymous"),
            )
            .unwrap();
        assert_eq!(request.query, "*:*");
    }

    #[test]
    fn test_bad_boost_rejected() {
        let adapter = adapter(Arc::new(StaticClient));
        let query = Query::builder("a:1").option("boost.title", "high").build();
        let err = adapter
            .build_request(&query, &PageRequest::default(), &AccessContext::anonymous("anonymous"))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_execute_translates_rows() {
        let adapter = adapter(Arc::new(StaticClient));
        let mut results = adapter
            .execute(
                &Query::new("*:*"),
                &PageRequest::default(),
                &AccessContext::anonymous("anonymous"),
            )
            .unwrap();

        let paths: Vec<String> = results.results().found().map(|r| r.path().to_string()).collect();
        assert_eq!(paths, vec!["/a", "2"]);
        assert_eq!(results.size(), 57);
    }

    #[test]
    fn test_execute_backend_failure() {
        let adapter = adapter(Arc::new(FailingClient));
        let err = adapter
            .execute(
                &Query::new("*:*"),
                &PageRequest::default(),
                &AccessContext::anonymous("anonymous"),
            )
            .err()
            .unwrap();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_describe_request() {
        let request = FulltextRequest {
            query: "a:1".to_string(),
            rows: 10,
            filter_queries: vec!["readers:anonymous".to_string()],
            ..Default::default()
        };
        let description = describe_request(&request);
        assert_eq!(description["fq"], "readers:anonymous");
        assert_eq!(description["rows"], "10");
    }
}
