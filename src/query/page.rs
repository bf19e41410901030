//! Page requests.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrawlError};

/// A zero-based page of `items_per_page` results.
///
/// Every page ends at or below `i64::MAX`, so offsets and totals derived from
/// it fit a signed size. Deserialization applies the same checks as [`new`].
///
/// [`new`]: PageRequest::new
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    page: u64,
    items_per_page: u64,
}

#[derive(Deserialize)]
struct RawPageRequest {
    page: u64,
    items_per_page: u64,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = TrawlError;

    fn try_from(raw: RawPageRequest) -> Result<Self> {
        PageRequest::new(raw.page, raw.items_per_page)
    }
}

impl PageRequest {
    /// Create a page request; `items_per_page` must be positive.
    pub fn new(page: u64, items_per_page: u64) -> Result<Self> {
        if items_per_page == 0 {
            return Err(TrawlError::invalid_argument(
                "items_per_page must be greater than 0",
            ));
        }
        let end = page
            .checked_add(1)
            .and_then(|next| next.checked_mul(items_per_page))
            .filter(|end| *end <= i64::MAX as u64);
        if end.is_none() {
            return Err(TrawlError::invalid_argument(format!(
                "page {page} with {items_per_page} items per page overflows the offset"
            )));
        }
        Ok(PageRequest {
            page,
            items_per_page,
        })
    }

    /// The first page of the given size.
    pub fn first(items_per_page: u64) -> Result<Self> {
        Self::new(0, items_per_page)
    }

    /// Get the zero-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Get the page size.
    pub fn items_per_page(&self) -> u64 {
        self.items_per_page
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.items_per_page)
    }

    /// The page after this one.
    pub fn next(&self) -> Result<Self> {
        Self::new(self.page.saturating_add(1), self.items_per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            items_per_page: 25,
        }
    }
}
