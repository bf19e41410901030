//! Boolean query trees produced by the parser.

use std::fmt;

use crate::query::term::TermQuery;

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Matches every item (`*:*`).
    MatchAll,
    /// A single field/term clause.
    Term(TermQuery),
    /// A combination of clauses.
    Boolean(BooleanQuery),
}

impl QueryNode {
    /// Render the node back to query syntax.
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Get the boolean query, if this node is one.
    pub fn as_boolean(&self) -> Option<&BooleanQuery> {
        match self {
            QueryNode::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Get the term query, if this node is one.
    pub fn as_term(&self) -> Option<&TermQuery> {
        match self {
            QueryNode::Term(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::MatchAll => write!(f, "*:*"),
            QueryNode::Term(t) => write!(f, "{t}"),
            QueryNode::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<TermQuery> for QueryNode {
    fn from(term: TermQuery) -> Self {
        QueryNode::Term(term)
    }
}

impl From<BooleanQuery> for QueryNode {
    fn from(query: BooleanQuery) -> Self {
        QueryNode::Boolean(query)
    }
}

/// A clause in a boolean query.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanClause {
    /// The query for this clause.
    pub query: QueryNode,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl BooleanClause {
    /// Create a new boolean clause.
    pub fn new(query: QueryNode, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }

    /// Create a MUST clause.
    pub fn must(query: QueryNode) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    /// Create a SHOULD clause.
    pub fn should(query: QueryNode) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    /// Create a MUST_NOT clause.
    pub fn must_not(query: QueryNode) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }
}

/// A boolean query that combines multiple clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanQuery {
    /// The clauses in this boolean query.
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    /// Create a new empty boolean query.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
        }
    }

    /// Add a clause to this boolean query.
    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: QueryNode) {
        self.add_clause(BooleanClause::must(query));
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: QueryNode) {
        self.add_clause(BooleanClause::should(query));
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: QueryNode) {
        self.add_clause(BooleanClause::must_not(query));
    }

    /// Get the clauses.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// Check if this query is empty.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Get clauses by occurrence type.
    pub fn clauses_by_occur(&self, occur: Occur) -> Vec<&BooleanClause> {
        self.clauses.iter().filter(|c| c.occur == occur).collect()
    }

    /// True when the query is a pure disjunction (every clause is SHOULD).
    pub fn is_disjunction(&self) -> bool {
        !self.clauses.is_empty() && self.clauses.iter().all(|c| c.occur == Occur::Should)
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let disjunction = self.is_disjunction();
        write!(f, "(")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", if disjunction { " OR " } else { " " })?;
            }
            match clause.occur {
                Occur::Must => write!(f, "+{}", clause.query)?,
                Occur::MustNot => write!(f, "-{}", clause.query)?,
                Occur::Should => write!(f, "{}", clause.query)?,
            }
        }
        write!(f, ")")
    }
}

/// Builder for creating boolean queries.
#[derive(Debug, Default)]
pub struct BooleanQueryBuilder {
    query: BooleanQuery,
}

impl BooleanQueryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a MUST clause.
    pub fn must(mut self, query: QueryNode) -> Self {
        self.query.add_must(query);
        self
    }

    /// Add a SHOULD clause.
    pub fn should(mut self, query: QueryNode) -> Self {
        self.query.add_should(query);
        self
    }

    /// Add a MUST_NOT clause.
    pub fn must_not(mut self, query: QueryNode) -> Self {
        self.query.add_must_not(query);
        self
    }

    /// Add a clause.
    pub fn clause(mut self, clause: BooleanClause) -> Self {
        self.query.add_clause(clause);
        self
    }

    /// Build the boolean query.
    pub fn build(self) -> BooleanQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: &str, value: &str) -> QueryNode {
        TermQuery::new(field, value).into()
    }

    #[test]
    fn test_boolean_query_display() {
        let query = BooleanQueryBuilder::new()
            .must(term("title", "hello"))
            .must_not(term("tag", "spam"))
            .build();
        assert_eq!(query.to_string(), "(+title:hello -tag:spam)");

        let query = BooleanQueryBuilder::new()
            .should(term("b", "2"))
            .should(term("b", "3"))
            .build();
        assert!(query.is_disjunction());
        assert_eq!(query.to_string(), "(b:2 OR b:3)");
    }

    #[test]
    fn test_clauses_by_occur() {
        let query = BooleanQueryBuilder::new()
            .must(term("a", "1"))
            .should(term("b", "2"))
            .must(term("c", "3"))
            .build();
        assert_eq!(query.clauses_by_occur(Occur::Must).len(), 2);
        assert_eq!(query.clauses_by_occur(Occur::Should).len(), 1);
        assert!(!query.is_disjunction());
    }

    #[test]
    fn test_empty() {
        let query = BooleanQuery::new();
        assert!(query.is_empty());
        assert!(!query.is_disjunction());
        assert_eq!(query.to_string(), "()");
    }
}
