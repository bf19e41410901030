//! In-memory content store.
//!
//! Matching and ordering happen when a scan starts; each item is then looked
//! up again as the scan reaches it, so an item removed mid-scan surfaces as a
//! per-item `NotFound` instead of stale data.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::access::AccessContext;
use crate::config::EngineConfig;
use crate::error::{Result, TrawlError};
use crate::query::decompose::{BooleanFilterMap, FilterValue};
use crate::query::sort::{SortOrder, SortSpec};
use crate::result::property_value::compare_sort_keys;
use crate::store::client::{
    ContentItem, ContentScan, ContentStore, ITEMS_HINT, OFFSET_HINT, PAGE_HINT, SORT_HINT,
    STATEMENT_SET_HINT,
};

type ItemMap = BTreeMap<String, ContentItem>;

/// Thread-safe in-memory [`ContentStore`].
pub struct MemoryContentStore {
    items: Arc<RwLock<ItemMap>>,
    statement_sets: RwLock<AHashMap<String, BooleanFilterMap>>,
    config: Arc<EngineConfig>,
}

impl MemoryContentStore {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        MemoryContentStore {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            statement_sets: RwLock::new(AHashMap::new()),
            config,
        }
    }

    /// Store an item, replacing any item at the same path.
    pub fn put(&self, item: ContentItem) {
        self.items.write().insert(item.path.clone(), item);
    }

    /// Remove the item at `path`.
    pub fn remove(&self, path: &str) -> Option<ContentItem> {
        self.items.write().remove(path)
    }

    pub fn get(&self, path: &str) -> Option<ContentItem> {
        self.items.read().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Register a named set of extra filters, selected by a query's name.
    pub fn define_statement_set<S: Into<String>>(&self, name: S, filters: BooleanFilterMap) {
        self.statement_sets.write().insert(name.into(), filters);
    }

    fn can_read(&self, access: &AccessContext, item: &ContentItem) -> bool {
        if access.is_admin(&self.config.admin_principal) {
            return true;
        }
        let readers = item.values(&self.config.readers_field);
        if readers.is_empty() {
            return true;
        }
        let principals = access.principals(&self.config.everyone_principal);
        readers
            .iter()
            .any(|reader| principals.contains(&reader.to_term_string().as_str()))
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new(Arc::new(EngineConfig::default()))
    }
}

fn has_value(item: &ContentItem, field: &str, wanted: &str) -> bool {
    item.values(field).iter().any(|v| v.to_term_string() == wanted)
}

fn matches_and(item: &ContentItem, filters: &BooleanFilterMap) -> bool {
    filters
        .and_filters()
        .all(|(field, value)| value.values().iter().all(|v| has_value(item, field, v)))
}

fn matches_or_sets(item: &ContentItem, filters: &BooleanFilterMap) -> bool {
    filters.or_sets().all(|(_, group)| {
        group.iter().any(|(field, value)| match value {
            FilterValue::OrSet(_) => false,
            _ => value.values().iter().any(|v| has_value(item, field, v)),
        })
    })
}

fn matches(item: &ContentItem, filters: &BooleanFilterMap) -> bool {
    matches_and(item, filters) && matches_or_sets(item, filters)
}

fn numeric_hint(filters: &BooleanFilterMap, name: &str) -> Result<Option<u64>> {
    filters
        .internal(name)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| {
                TrawlError::invalid_argument(format!("hint '{name}' is not a number: {value}"))
            })
        })
        .transpose()
}

fn compare_items(a: &ContentItem, b: &ContentItem, sort: &[SortSpec]) -> Ordering {
    sort.iter()
        .map(|spec| {
            let ordering = compare_sort_keys(a.first_value(&spec.field), b.first_value(&spec.field));
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.path.cmp(&b.path))
}

impl ContentStore for MemoryContentStore {
    fn find(&self, access: &AccessContext, filters: &BooleanFilterMap) -> Result<ContentScan> {
        let statement_set = match filters.internal(STATEMENT_SET_HINT) {
            Some(name) => match self.statement_sets.read().get(name) {
                Some(set) => Some(set.clone()),
                None => {
                    return Err(TrawlError::invalid_argument(format!(
                        "unknown statement set '{name}'"
                    )));
                }
            },
            None => None,
        };
        let sort = match filters.internal(SORT_HINT) {
            Some(spec) => SortSpec::parse_list(spec)?,
            None => Vec::new(),
        };
        let items_per_page = numeric_hint(filters, ITEMS_HINT)?;
        let offset = match numeric_hint(filters, OFFSET_HINT)? {
            Some(offset) => offset,
            None => numeric_hint(filters, PAGE_HINT)?.unwrap_or(0) * items_per_page.unwrap_or(0),
        };

        let items = self.items.read();
        let mut hits: Vec<&ContentItem> = items
            .values()
            .filter(|item| self.can_read(access, item))
            .filter(|item| matches(item, filters))
            .filter(|item| statement_set.as_ref().is_none_or(|set| matches(item, set)))
            .collect();
        if !sort.is_empty() {
            hits.sort_by(|a, b| compare_items(a, b, &sort));
        }

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = items_per_page
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(usize::MAX);
        let paths: Vec<String> = hits
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|item| item.path.clone())
            .collect();

        debug!(
            user = access.user_id(),
            offset,
            returned = paths.len(),
            "memory store scan"
        );

        let store = Arc::clone(&self.items);
        Ok(Box::new(paths.into_iter().map(move |path| {
            store
                .read()
                .get(&path)
                .cloned()
                .ok_or_else(|| TrawlError::not_found(path))
        })))
    }
}
