//! Decomposition of boolean queries into AND/OR property filters.
//!
//! The direct store has no boolean parser of its own; it accepts a flat map of
//! `field -> value(s)` (all must match) plus `orsetN` sub-maps (any entry may
//! match). Only one level of OR nesting is honored: groups nested inside an OR
//! group are dropped.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TrawlError};
use crate::query::boolean::{BooleanQuery, Occur, QueryNode};
use crate::query::parser::QueryParser;
use crate::query::search_query::RESERVED_PREFIX;

/// Key prefix of OR groups inside a [`BooleanFilterMap`].
pub const OR_SET_PREFIX: &str = "orset";

/// One entry of a filter map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single required value.
    Single(String),
    /// Several values; in the outer map all must match.
    Multi(Vec<String>),
    /// An OR group: any of its entries may match.
    OrSet(BTreeMap<String, FilterValue>),
}

impl FilterValue {
    /// Values held by a `Single` or `Multi` entry.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(v) => vec![v.as_str()],
            FilterValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
            FilterValue::OrSet(_) => Vec::new(),
        }
    }

    /// The first value of a `Single` or `Multi` entry.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Single(v) => Some(v),
            FilterValue::Multi(vs) => vs.first().map(String::as_str),
            FilterValue::OrSet(_) => None,
        }
    }
}

fn accumulate(map: &mut BTreeMap<String, FilterValue>, field: &str, value: &str) {
    match map.entry(field.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(FilterValue::Single(value.to_string()));
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            FilterValue::Single(existing) => {
                let first = std::mem::take(existing);
                slot.insert(FilterValue::Multi(vec![first, value.to_string()]));
            }
            FilterValue::Multi(values) => values.push(value.to_string()),
            FilterValue::OrSet(_) => {
                debug!(field, "field name collides with an OR group, value dropped");
            }
        },
    }
}

/// Property filters for a direct-store scan.
///
/// Content fields, `orsetN` groups and `_`-prefixed engine hints (paging,
/// sort, statement set) share one key space; the prefix keeps them apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BooleanFilterMap {
    entries: BTreeMap<String, FilterValue>,
    #[serde(skip)]
    next_or_set: usize,
}

impl BooleanFilterMap {
    /// Create an empty filter map (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conjunctive value; repeated fields accumulate into a list.
    pub fn add_value(&mut self, field: &str, value: &str) {
        accumulate(&mut self.entries, field, value);
    }

    /// Attach an OR group under the next free `orsetN` key and return the key.
    pub fn add_or_set(&mut self, or_set: BTreeMap<String, FilterValue>) -> String {
        let mut key = format!("{OR_SET_PREFIX}{}", self.next_or_set);
        while self.entries.contains_key(&key) {
            self.next_or_set += 1;
            key = format!("{OR_SET_PREFIX}{}", self.next_or_set);
        }
        self.next_or_set += 1;
        self.entries.insert(key.clone(), FilterValue::OrSet(or_set));
        key
    }

    /// Set an engine hint; the reserved prefix is added when missing.
    pub fn set_internal<V: Into<String>>(&mut self, key: &str, value: V) {
        let key = if key.starts_with(RESERVED_PREFIX) {
            key.to_string()
        } else {
            format!("{RESERVED_PREFIX}{key}")
        };
        self.entries.insert(key, FilterValue::Single(value.into()));
    }

    /// Read an engine hint by its unprefixed name.
    pub fn internal(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&format!("{RESERVED_PREFIX}{key}"))
            .and_then(FilterValue::as_str)
    }

    /// Drop an engine hint by its unprefixed name.
    pub fn remove_internal(&mut self, key: &str) -> Option<FilterValue> {
        self.entries.remove(&format!("{RESERVED_PREFIX}{key}"))
    }

    /// Look up an entry by its full key.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    /// Conjunctive content filters (no hints, no OR groups).
    pub fn and_filters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            FilterValue::OrSet(_) => None,
            _ if k.starts_with(RESERVED_PREFIX) => None,
            _ => Some((k.as_str(), v)),
        })
    }

    /// OR groups in key order.
    pub fn or_sets(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, FilterValue>)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            FilterValue::OrSet(set) => Some((k.as_str(), set)),
            _ => None,
        })
    }

    /// All entries, including hints.
    pub fn entries(&self) -> &BTreeMap<String, FilterValue> {
        &self.entries
    }

    /// True when no content filters are present.
    pub fn has_no_content_filters(&self) -> bool {
        self.and_filters().next().is_none() && self.or_sets().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns field-query strings into [`BooleanFilterMap`]s.
#[derive(Debug, Clone, Default)]
pub struct QueryDecomposer {
    parser: QueryParser,
}

impl QueryDecomposer {
    /// Create a decomposer with a schema-less parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decomposer around a configured parser.
    pub fn with_parser(parser: QueryParser) -> Self {
        QueryDecomposer { parser }
    }

    /// Parse and decompose a query string.
    pub fn decompose(&self, query_string: &str) -> Result<BooleanFilterMap> {
        let node = self.parser.parse(query_string)?;
        decompose_node(&node)
    }
}

/// Decompose a parsed query tree.
///
/// Negated clauses cannot be expressed as store filters and are rejected, as
/// are fields under the reserved hint prefix.
pub fn decompose_node(node: &QueryNode) -> Result<BooleanFilterMap> {
    reject_reserved_fields(node)?;
    let mut filters = BooleanFilterMap::new();

    match node {
        QueryNode::MatchAll => {}
        QueryNode::Term(term) => filters.add_value(term.field(), term.term()),
        QueryNode::Boolean(root) if root.is_disjunction() => {
            if let Some(or_set) = collect_or_set(root)? {
                filters.add_or_set(or_set);
            }
        }
        QueryNode::Boolean(root) => {
            let mut loose_or = BTreeMap::new();
            for clause in root.clauses() {
                reject_negation(clause.occur, &clause.query)?;
                match &clause.query {
                    QueryNode::MatchAll => {}
                    QueryNode::Term(term) if clause.occur == Occur::Should => {
                        accumulate(&mut loose_or, term.field(), term.term());
                    }
                    QueryNode::Term(term) => filters.add_value(term.field(), term.term()),
                    QueryNode::Boolean(group) if group.is_disjunction() => {
                        if let Some(or_set) = collect_or_set(group)? {
                            filters.add_or_set(or_set);
                        }
                    }
                    QueryNode::Boolean(group) => merge_conjunction(group, &mut filters)?,
                }
            }
            if !loose_or.is_empty() {
                filters.add_or_set(loose_or);
            }
        }
    }

    Ok(filters)
}

/// Collect the terms of one OR group. `None` means the group always matches.
fn collect_or_set(group: &BooleanQuery) -> Result<Option<BTreeMap<String, FilterValue>>> {
    let mut or_set = BTreeMap::new();
    for clause in group.clauses() {
        reject_negation(clause.occur, &clause.query)?;
        match &clause.query {
            QueryNode::Term(term) => accumulate(&mut or_set, term.field(), term.term()),
            QueryNode::MatchAll => return Ok(None),
            QueryNode::Boolean(nested) => {
                debug!(group = %nested, "ignoring group nested inside an OR group");
            }
        }
    }
    Ok(if or_set.is_empty() { None } else { Some(or_set) })
}

/// Fold a parenthesized conjunction into the outer AND map.
fn merge_conjunction(group: &BooleanQuery, filters: &mut BooleanFilterMap) -> Result<()> {
    for clause in group.clauses() {
        reject_negation(clause.occur, &clause.query)?;
        match &clause.query {
            QueryNode::Term(term) => filters.add_value(term.field(), term.term()),
            QueryNode::MatchAll => {}
            QueryNode::Boolean(nested) => {
                debug!(group = %nested, "ignoring group nested more than one level deep");
            }
        }
    }
    Ok(())
}

fn reject_reserved_fields(node: &QueryNode) -> Result<()> {
    match node {
        QueryNode::MatchAll => Ok(()),
        QueryNode::Term(term) if term.field().starts_with(RESERVED_PREFIX) => {
            Err(TrawlError::query_parse(format!(
                "field '{}' uses the reserved prefix '{RESERVED_PREFIX}'",
                term.field()
            )))
        }
        QueryNode::Term(_) => Ok(()),
        QueryNode::Boolean(query) => query
            .clauses()
            .iter()
            .try_for_each(|clause| reject_reserved_fields(&clause.query)),
    }
}

fn reject_negation(occur: Occur, query: &QueryNode) -> Result<()> {
    if occur == Occur::MustNot {
        return Err(TrawlError::query_parse(format!(
            "negated clause '{query}' cannot be expressed as a store filter"
        )));
    }
    Ok(())
}
