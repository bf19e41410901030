use std::collections::BTreeMap;
use std::sync::Arc;

use trawl::access::AccessContext;
use trawl::config::EngineConfig;
use trawl::error::{Result, TrawlError};
use trawl::fulltext::{FulltextDocument, FulltextQueryAdapter, MemoryFulltextEngine};
use trawl::query::{DIRECT_STORE_BACKEND, FULLTEXT_BACKEND, PageRequest, Query, QueryTemplate};
use trawl::result::ResultSet;
use trawl::router::QueryRouter;
use trawl::store::{ContentItem, DirectStoreQueryAdapter, MemoryContentStore};

fn build_router() -> QueryRouter {
    let config = Arc::new(EngineConfig::default());

    let engine = Arc::new(MemoryFulltextEngine::new());
    let store = Arc::new(MemoryContentStore::new(config.clone()));
    for i in 0..30i64 {
        let tag = if i % 2 == 0 { "even" } else { "odd" };
        let path = format!("/content/{i:02}");
        engine.add_document(
            FulltextDocument::new(i.to_string())
                .add_value("path", path.as_str())
                .add_value("tag", tag)
                .add_value("rank", i)
                .add_value("readers", "anonymous"),
        );
        store.put(ContentItem::new(path).add_value("tag", tag).add_value("rank", i));
    }

    QueryRouter::new()
        .with_adapter(
            FULLTEXT_BACKEND,
            Arc::new(FulltextQueryAdapter::new(engine, config.clone())),
        )
        .with_adapter(
            DIRECT_STORE_BACKEND,
            Arc::new(DirectStoreQueryAdapter::new(store, config)),
        )
}

fn snapshot(mut results: Box<dyn ResultSet>) -> (i64, Vec<String>) {
    let paths = results.results().found().map(|r| r.path().to_string()).collect();
    (results.size(), paths)
}

#[test]
fn repeated_execution_is_idempotent() -> Result<()> {
    let router = build_router();
    let page = PageRequest::new(1, 4)?;
    let access = AccessContext::anonymous("anonymous");

    for backend in [FULLTEXT_BACKEND, DIRECT_STORE_BACKEND] {
        let query = Query::builder("tag:even")
            .query_type(backend)
            .option("sort", "rank desc")
            .build();

        let first = snapshot(router.execute(&query, &page, &access)?);
        let second = snapshot(router.execute(&query, &page, &access)?);

        assert_eq!(first, second, "backend {backend}");
        assert_eq!(
            first.1,
            vec!["/content/20", "/content/18", "/content/16", "/content/14"],
            "backend {backend}"
        );
        assert_eq!(first.0, 15, "backend {backend}");
    }
    Ok(())
}

#[test]
fn unknown_backend_has_no_fallback() {
    let router = build_router();
    let query = Query::builder("tag:even").query_type("sql").build();

    let err = router
        .execute(&query, &PageRequest::default(), &AccessContext::anonymous("anonymous"))
        .err()
        .unwrap();
    assert!(matches!(err, TrawlError::UnknownBackendType(_)));
}

#[test]
fn template_resolution_feeds_the_router() -> Result<()> {
    let router = build_router();
    let template = QueryTemplate::new("tag:{tag} AND rank:{rank|0}");

    let properties = BTreeMap::from([("tag".to_string(), "odd".to_string())]);
    let options = BTreeMap::new();
    let query = template.resolve_query(&properties, &options, None, " STORE ")?;
    assert_eq!(query.query_string(), "tag:odd AND rank:0");

    let (size, paths) = snapshot(router.execute(
        &query,
        &PageRequest::default(),
        &AccessContext::anonymous("anonymous"),
    )?);
    assert_eq!(size, 0);
    assert!(paths.is_empty());

    let err = template
        .resolve_query(&BTreeMap::new(), &options, None, FULLTEXT_BACKEND)
        .err()
        .unwrap();
    assert_eq!(err.status_code(), 400);
    Ok(())
}

#[test]
fn user_options_cannot_set_reserved_keys() -> Result<()> {
    let router = build_router();
    let query = Query::builder("tag:odd")
        .query_type(DIRECT_STORE_BACKEND)
        .build()
        .merge_user_options([("_offset", "25"), ("sort", "rank")]);

    assert_eq!(query.option("_offset"), None);

    let (size, paths) = snapshot(router.execute(
        &query,
        &PageRequest::first(3)?,
        &AccessContext::anonymous("anonymous"),
    )?);
    assert_eq!(paths, vec!["/content/01", "/content/03", "/content/05"]);
    assert_eq!(size, 15);
    Ok(())
}
