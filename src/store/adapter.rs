//! Executes queries as property-filtered scans of the content store.
//!
//! The store cannot count matches, so the reported size is an estimate built
//! from how full the requested page came back, plus one bounded probe scan
//! when the page was exactly full.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::access::AccessContext;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::monitor::SlowQueryMonitor;
use crate::query::decompose::{BooleanFilterMap, QueryDecomposer};
use crate::query::page::PageRequest;
use crate::query::search_query::{DIRECT_STORE_BACKEND, Query, is_reserved_key};
use crate::result::counting::BoundedCountingIterator;
use crate::result::result_set::{ResultSet, ResultSetSizeOverride, Results};
use crate::result::search_result::{ItemOutcome, SkippedItem};
use crate::router::ResultSetFactory;
use crate::store::client::{
    ContentItem, ContentScan, ContentStore, ITEMS_HINT, OFFSET_HINT, PAGE_HINT,
    STATEMENT_SET_HINT,
};

/// Item-level failures become skipped rows carrying the item path. Any other
/// failure ends the stream; failures inside the counted page are caught
/// before the result set is built.
fn outcomes<I>(scan: I) -> impl Iterator<Item = ItemOutcome> + Send + 'static
where
    I: Iterator<Item = Result<ContentItem>> + Send + 'static,
{
    scan.map_while(|item| match item {
        Ok(item) => Some(ItemOutcome::Found(item.into())),
        Err(error) if error.is_item_level() => {
            let path = error.item_path().map(str::to_string);
            Some(ItemOutcome::Skipped(SkippedItem::new(path, error)))
        }
        Err(error) => {
            warn!(%error, "store scan failed past the counted page");
            None
        }
    })
}

fn to_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Estimate the total number of matches from one page scan.
///
/// `query_count` is the size reported by the page scan's counter; `probe`
/// counts the rows of a scan starting at the given offset. It is only called
/// when the page came back exactly full.
pub fn estimate_total<F>(query_count: i64, page: &PageRequest, probe: F) -> Result<i64>
where
    F: FnOnce(u64) -> Result<u64>,
{
    let offset = to_count(page.offset());
    let nitems = to_count(page.items_per_page());

    if query_count < 0 {
        Ok(query_count)
    } else if query_count == 0 {
        Ok(offset)
    } else if query_count == nitems {
        let start = page.offset().saturating_add(page.items_per_page());
        let additional = probe(start)?;
        Ok(to_count(start).saturating_add(to_count(additional)))
    } else {
        Ok(offset.saturating_add(query_count))
    }
}

/// Rows of one page scan.
pub struct StoreResultSet {
    rows: Option<BoundedCountingIterator<ContentScan>>,
    size: i64,
}

impl StoreResultSet {
    fn new(rows: BoundedCountingIterator<ContentScan>) -> Self {
        let size = rows.size();
        StoreResultSet {
            rows: Some(rows),
            size,
        }
    }
}

impl ResultSet for StoreResultSet {
    fn results(&mut self) -> Results {
        match self.rows.take() {
            Some(rows) => Results::new(outcomes(rows)),
            None => Results::empty(),
        }
    }

    /// Size of the page as counted, not the total.
    fn size(&self) -> i64 {
        self.size
    }
}

/// Adapter for the direct content-store backend.
///
/// Read access is enforced by the store itself; the caller's
/// [`AccessContext`] is handed through unchanged.
pub struct DirectStoreQueryAdapter {
    store: Arc<dyn ContentStore>,
    config: Arc<EngineConfig>,
    decomposer: QueryDecomposer,
    monitor: SlowQueryMonitor,
}

impl DirectStoreQueryAdapter {
    pub fn new(store: Arc<dyn ContentStore>, config: Arc<EngineConfig>) -> Self {
        let monitor = SlowQueryMonitor::from_config(&config);
        DirectStoreQueryAdapter {
            store,
            config,
            decomposer: QueryDecomposer::new(),
            monitor,
        }
    }

    /// Replace the decomposer, e.g. to allow a default field.
    pub fn with_decomposer(mut self, decomposer: QueryDecomposer) -> Self {
        self.decomposer = decomposer;
        self
    }

    /// Decompose the query and attach paging, options and statement set.
    pub fn build_filters(&self, query: &Query, page: &PageRequest) -> Result<BooleanFilterMap> {
        let mut filters = self.decomposer.decompose(query.query_string())?;

        for (key, value) in query.options() {
            if !is_reserved_key(key) {
                filters.set_internal(key, value.as_str());
            }
        }
        filters.set_internal(PAGE_HINT, page.page().to_string());
        filters.set_internal(ITEMS_HINT, page.items_per_page().to_string());
        filters.set_internal(OFFSET_HINT, page.offset().to_string());
        if let Some(name) = query.name() {
            filters.set_internal(STATEMENT_SET_HINT, name);
        }

        Ok(filters)
    }

    /// Count the rows of a scan starting at `start`, up to the probe cap.
    fn probe(
        &self,
        access: &AccessContext,
        filters: &BooleanFilterMap,
        start: u64,
        label: &str,
    ) -> Result<u64> {
        let mut probe_filters = filters.clone();
        probe_filters.remove_internal(PAGE_HINT);
        probe_filters.set_internal(OFFSET_HINT, start.to_string());
        probe_filters.set_internal(ITEMS_HINT, self.config.default_max_results.to_string());

        self.monitor.time(DIRECT_STORE_BACKEND, label, || {
            let scan = self.store.find(access, &probe_filters)?;
            let mut count = 0;
            for item in scan.take(self.config.default_max_results) {
                match item {
                    Ok(_) => count += 1,
                    Err(error) if error.is_item_level() => {
                        debug!(%error, "probe skipped item");
                    }
                    Err(error) => return Err(error),
                }
            }
            Ok(count)
        })
    }
}

impl ResultSetFactory for DirectStoreQueryAdapter {
    fn execute(
        &self,
        query: &Query,
        page: &PageRequest,
        access: &AccessContext,
    ) -> Result<Box<dyn ResultSet>> {
        let filters = self.build_filters(query, page)?;
        let label = query.query_string();
        let cap = usize::try_from(page.items_per_page()).unwrap_or(usize::MAX);

        let rows = self.monitor.time(DIRECT_STORE_BACKEND, label, || {
            let scan = self.store.find(access, &filters)?;
            let mut rows = BoundedCountingIterator::new(scan, cap);
            let failure = rows.remove_buffered(|item| {
                matches!(item, Err(error) if !error.is_item_level())
            });
            match failure {
                Some(Err(error)) => Err(error),
                _ => Ok(rows),
            }
        })?;
        let primary = StoreResultSet::new(rows);

        let total = estimate_total(primary.size(), page, |start| {
            self.probe(access, &filters, start, label)
        })?;
        debug!(
            query = label,
            page_count = primary.size(),
            estimated_total = total,
            "estimated direct-store total"
        );

        Ok(Box::new(ResultSetSizeOverride::new(primary, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, items: u64) -> PageRequest {
        PageRequest::new(page, items).unwrap()
    }

    #[test]
    fn test_estimate_unknown_passes_through() {
        let total = estimate_total(-10, &page(2, 10), |_| panic!("no probe")).unwrap();
        assert_eq!(total, -10);
    }

    #[test]
    fn test_estimate_empty_page() {
        assert_eq!(estimate_total(0, &page(0, 10), |_| panic!("no probe")).unwrap(), 0);
        assert_eq!(estimate_total(0, &page(3, 10), |_| panic!("no probe")).unwrap(), 30);
    }

    #[test]
    fn test_estimate_partial_page_is_last() {
        assert_eq!(estimate_total(4, &page(2, 10), |_| panic!("no probe")).unwrap(), 24);
    }

    #[test]
    fn test_estimate_full_page_probes() {
        let mut probed_at = None;
        let total = estimate_total(10, &page(1, 10), |start| {
            probed_at = Some(start);
            Ok(7)
        })
        .unwrap();
        assert_eq!(probed_at, Some(20));
        assert_eq!(total, 27);
    }

    #[test]
    fn test_estimate_at_largest_page_stays_positive() {
        let last = page((i64::MAX as u64) / 2 - 1, 2);
        assert_eq!(estimate_total(0, &last, |_| panic!("no probe")).unwrap(), i64::MAX - 3);
        assert_eq!(estimate_total(1, &last, |_| panic!("no probe")).unwrap(), i64::MAX - 2);

        let total = estimate_total(2, &last, |_| Ok(u64::MAX)).unwrap();
        assert_eq!(total, i64::MAX);
    }

    #[test]
    fn test_estimate_probe_error_propagates() {
        let err = estimate_total(10, &page(0, 10), |_| {
            Err(crate::error::TrawlError::backend("store offline"))
        })
        .unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
