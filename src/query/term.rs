//! Field/term clauses.

use std::fmt;

/// Characters that must be escaped inside a bare query term.
const SPECIAL_CHARS: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    '/',
];

/// Escape a value so it parses back as a single bare term.
pub fn escape_term(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if SPECIAL_CHARS.contains(&ch) || ch.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A clause matching items whose `field` holds `term`.
///
/// Terms are not analyzed here; backends decide how to compare them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
}

impl TermQuery {
    /// Create a new term query.
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }
}

impl fmt::Display for TermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.term.chars().any(char::is_whitespace) {
            write!(f, "{}:\"{}\"", self.field, self.term.replace('"', "\\\""))
        } else {
            write!(f, "{}:{}", self.field, escape_term(&self.term))
        }
    }
}
