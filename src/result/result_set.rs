//! The uniform view over backend rows.

use tracing::debug;

use crate::result::search_result::{ItemOutcome, SearchResult};

/// A single-pass stream of item outcomes.
pub struct Results {
    inner: Box<dyn Iterator<Item = ItemOutcome> + Send>,
}

impl Results {
    /// Wrap any outcome iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = ItemOutcome> + Send + 'static,
    {
        Results {
            inner: Box::new(iter),
        }
    }

    /// A stream with no items.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Only the found results; skipped items are logged and dropped.
    pub fn found(self) -> impl Iterator<Item = SearchResult> + Send {
        self.inner.filter_map(|outcome| match outcome {
            ItemOutcome::Found(result) => Some(result),
            ItemOutcome::Skipped(skipped) => {
                debug!(
                    path = skipped.path.as_deref().unwrap_or("<unknown>"),
                    reason = %skipped.error,
                    "skipping result item"
                );
                None
            }
        })
    }
}

impl Iterator for Results {
    type Item = ItemOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Rows of one executed query plus its reported size.
///
/// `results` is single-pass: the first call hands out the rows, later calls
/// return an empty stream. `size` never consumes the rows and may be asked
/// before, during, or after iteration. A negative size means "at least
/// `|size|` results, exact count unknown"; the direct-store backend may
/// report an estimate.
pub trait ResultSet: Send {
    /// Take the rows.
    fn results(&mut self) -> Results;

    /// Total number of matches (see the trait docs for sign and accuracy).
    fn size(&self) -> i64;
}

impl<R: ResultSet + ?Sized> ResultSet for Box<R> {
    fn results(&mut self) -> Results {
        (**self).results()
    }

    fn size(&self) -> i64 {
        (**self).size()
    }
}

/// Replaces the reported size of another result set; iteration is delegated.
pub struct ResultSetSizeOverride<R> {
    inner: R,
    size: i64,
}

impl<R: ResultSet> ResultSetSizeOverride<R> {
    pub fn new(inner: R, size: i64) -> Self {
        ResultSetSizeOverride { inner, size }
    }

    /// Size the wrapped set would have reported.
    pub fn inner_size(&self) -> i64 {
        self.inner.size()
    }
}

impl<R: ResultSet> ResultSet for ResultSetSizeOverride<R> {
    fn results(&mut self) -> Results {
        self.inner.results()
    }

    fn size(&self) -> i64 {
        self.size
    }
}

/// An in-memory result set over already materialized outcomes.
pub struct VecResultSet {
    rows: Option<Vec<ItemOutcome>>,
    size: i64,
}

impl VecResultSet {
    /// Size is the number of rows.
    pub fn new(rows: Vec<ItemOutcome>) -> Self {
        let size = rows.len() as i64;
        VecResultSet {
            rows: Some(rows),
            size,
        }
    }

    /// Build from found results only.
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        Self::new(results.into_iter().map(ItemOutcome::Found).collect())
    }

    /// A result set with no rows.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl ResultSet for VecResultSet {
    fn results(&mut self) -> Results {
        match self.rows.take() {
            Some(rows) => Results::new(rows.into_iter()),
            None => Results::empty(),
        }
    }

    fn size(&self) -> i64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrawlError;
    use crate::result::search_result::SkippedItem;

    fn rows() -> Vec<ItemOutcome> {
        vec![
            ItemOutcome::Found(SearchResult::new("/a")),
            ItemOutcome::Skipped(SkippedItem::new(
                Some("/b".to_string()),
                TrawlError::access_denied("/b"),
            )),
            ItemOutcome::Found(SearchResult::new("/c")),
        ]
    }

    #[test]
    fn test_single_pass() {
        let mut set = VecResultSet::new(rows());
        assert_eq!(set.results().count(), 3);
        assert_eq!(set.results().count(), 0);
        assert_eq!(set.size(), 3);
    }

    #[test]
    fn test_found_skips_denied_items() {
        let mut set = VecResultSet::new(rows());
        let paths: Vec<String> = set.results().found().map(|r| r.path().to_string()).collect();
        assert_eq!(paths, vec!["/a", "/c"]);
    }

    #[test]
    fn test_size_override() {
        let mut set = ResultSetSizeOverride::new(VecResultSet::new(rows()), 42);
        assert_eq!(set.size(), 42);
        assert_eq!(set.inner_size(), 3);
        assert_eq!(set.results().count(), 3);
        assert_eq!(set.size(), 42);
    }

    #[test]
    fn test_boxed_result_set() {
        let mut set: Box<dyn ResultSet> = Box::new(VecResultSet::empty());
        assert_eq!(set.size(), 0);
        assert_eq!(set.results().count(), 0);
    }
}
