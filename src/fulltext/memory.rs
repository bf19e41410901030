//! In-memory full-text engine.
//!
//! Evaluates the same query syntax the real engine accepts, against documents
//! held in memory. Matching is case-insensitive on whitespace tokens; a term
//! containing whitespace matches as a phrase.

use std::cmp::Ordering;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::fulltext::client::{FulltextClient, FulltextDocument, FulltextRequest, FulltextResponse};
use crate::query::boolean::{BooleanQuery, Occur, QueryNode};
use crate::query::parser::QueryParser;
use crate::query::sort::SortOrder;
use crate::query::term::TermQuery;
use crate::result::property_value::compare_sort_keys;

/// Thread-safe document store answering [`FulltextRequest`]s.
#[derive(Debug, Default)]
pub struct MemoryFulltextEngine {
    documents: RwLock<Vec<FulltextDocument>>,
    parser: QueryParser,
}

impl MemoryFulltextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `parser` for query text and filter queries.
    pub fn with_parser(parser: QueryParser) -> Self {
        MemoryFulltextEngine {
            documents: RwLock::new(Vec::new()),
            parser,
        }
    }

    /// Add or replace a document by id.
    pub fn add_document(&self, document: FulltextDocument) {
        let mut documents = self.documents.write();
        match documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }

    /// Remove a document; returns whether it existed.
    pub fn delete_document(&self, id: &str) -> bool {
        let mut documents = self.documents.write();
        let before = documents.len();
        documents.retain(|d| d.id != id);
        documents.len() != before
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(str::to_lowercase)
}

fn term_matches(document: &FulltextDocument, term: &TermQuery) -> bool {
    let Some(values) = document.fields.get(term.field()) else {
        return false;
    };
    if term.term() == "*" {
        return !values.is_empty();
    }

    let wanted = term.term().to_lowercase();
    values.iter().any(|value| {
        let text = value.to_term_string().to_lowercase();
        if text == wanted {
            return true;
        }
        if wanted.contains(char::is_whitespace) {
            let phrase: Vec<String> = tokens(&wanted).collect();
            if phrase.is_empty() {
                return false;
            }
            let words: Vec<String> = tokens(&text).collect();
            return words.windows(phrase.len()).any(|w| w == phrase.as_slice());
        }
        tokens(&text).any(|token| token == wanted)
    })
}

fn boolean_matches(document: &FulltextDocument, query: &BooleanQuery) -> bool {
    let mut has_required = false;
    let mut any_should = false;
    let mut has_should = false;

    for clause in query.clauses() {
        let hit = node_matches(document, &clause.query);
        match clause.occur {
            Occur::Must => {
                has_required = true;
                if !hit {
                    return false;
                }
            }
            Occur::MustNot => {
                if hit {
                    return false;
                }
            }
            Occur::Should => {
                has_should = true;
                any_should |= hit;
            }
        }
    }

    has_required || !has_should || any_should
}

fn node_matches(document: &FulltextDocument, node: &QueryNode) -> bool {
    match node {
        QueryNode::MatchAll => true,
        QueryNode::Term(term) => term_matches(document, term),
        QueryNode::Boolean(query) => boolean_matches(document, query),
    }
}

impl FulltextClient for MemoryFulltextEngine {
    fn search(&self, request: &FulltextRequest) -> Result<FulltextResponse> {
        let mut filters = Vec::with_capacity(request.filter_queries.len() + 1);
        filters.push(self.parser.parse(&request.query)?);
        for filter in &request.filter_queries {
            filters.push(self.parser.parse(filter)?);
        }

        let documents = self.documents.read();
        let mut hits: Vec<&FulltextDocument> = documents
            .iter()
            .filter(|doc| filters.iter().all(|f| node_matches(doc, f)))
            .collect();

        if !request.sort.is_empty() {
            hits.sort_by(|a, b| {
                request
                    .sort
                    .iter()
                    .map(|spec| {
                        let ordering =
                            compare_sort_keys(a.first_value(&spec.field), b.first_value(&spec.field));
                        match spec.order {
                            SortOrder::Asc => ordering,
                            SortOrder::Desc => ordering.reverse(),
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let num_found = hits.len() as u64;
        let start = usize::try_from(request.start).unwrap_or(usize::MAX);
        let rows = usize::try_from(request.rows).unwrap_or(usize::MAX);
        let page: Vec<FulltextDocument> = hits.into_iter().skip(start).take(rows).cloned().collect();

        debug!(
            query = %request.query,
            num_found,
            returned = page.len(),
            "memory engine search"
        );

        Ok(FulltextResponse {
            documents: page,
            num_found,
        })
    }
}
