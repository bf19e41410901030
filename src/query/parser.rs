//! Query parser for converting field-query strings into query trees.

use std::mem;

use crate::error::{Result, TrawlError};
use crate::query::boolean::{BooleanClause, BooleanQuery, BooleanQueryBuilder, Occur, QueryNode};
use crate::query::term::TermQuery;

/// A field-query parser.
/// Schema-less: no field validation, accepts any field name.
#[derive(Debug, Clone)]
pub struct QueryParser {
    /// Default field to search in when no field is specified.
    default_field: Option<String>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// Create a new query parser (schema-less).
    pub fn new() -> Self {
        QueryParser {
            default_field: None,
        }
    }

    /// Set the default field to search in when no field is specified.
    pub fn with_default_field<S: Into<String>>(mut self, field: S) -> Self {
        self.default_field = Some(field.into());
        self
    }

    /// Parse a query string into a query tree.
    ///
    /// Supported syntax:
    /// - Simple terms: `hello` (needs a default field)
    /// - Field-specific terms: `title:hello`
    /// - Phrases: `"hello world"`, `title:"hello world"`
    /// - Field groups: `readers:(alice OR staff)`
    /// - Boolean operators: `+required -forbidden NOT forbidden`
    /// - Parentheses: `(title:hello OR body:world)`
    /// - AND/OR operators; juxtaposition is an implicit AND
    /// - Match all: `*:*`
    ///
    /// An empty string parses to an empty boolean query.
    pub fn parse(&self, query_str: &str) -> Result<QueryNode> {
        let trimmed = query_str.trim();
        if trimmed.is_empty() {
            return Ok(QueryNode::Boolean(BooleanQuery::new()));
        }

        let mut parser = QueryStringParser::new(trimmed, self.default_field.clone());
        parser.parse()
    }

    /// Parse a query string for a specific field.
    pub fn parse_field(&self, field: &str, query_str: &str) -> Result<QueryNode> {
        let trimmed = query_str.trim();
        if trimmed.is_empty() {
            return Ok(QueryNode::Boolean(BooleanQuery::new()));
        }

        let mut parser = QueryStringParser::new(trimmed, Some(field.to_string()));
        parser.parse()
    }

    /// Get the default field.
    pub fn default_field(&self) -> Option<&str> {
        self.default_field.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    And,
    Or,
    Not,
}

impl Keyword {
    fn as_str(&self) -> &'static str {
        match self {
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
        }
    }
}

/// Internal parser for parsing query strings.
struct QueryStringParser<'a> {
    input: &'a str,
    pos: usize,
    default_field: Option<String>,
}

impl<'a> QueryStringParser<'a> {
    fn new(input: &'a str, default_field: Option<String>) -> Self {
        QueryStringParser {
            input,
            pos: 0,
            default_field,
        }
    }

    fn parse(&mut self) -> Result<QueryNode> {
        let node = self.parse_or_expression()?;
        self.skip_whitespace();
        if let Some(ch) = self.peek_char() {
            return Err(self.error(format!("unexpected '{ch}'")));
        }
        Ok(node)
    }

    fn parse_or_expression(&mut self) -> Result<QueryNode> {
        let mut operands = vec![self.parse_and_expression()?];

        while self.peek_keyword() == Some(Keyword::Or) {
            self.consume_keyword(Keyword::Or);
            operands.push(self.parse_and_expression()?);
        }

        if operands.len() == 1 {
            return Ok(operands.remove(0));
        }

        let builder = operands
            .into_iter()
            .fold(BooleanQueryBuilder::new(), |builder, operand| {
                builder.should(operand)
            });
        Ok(QueryNode::Boolean(builder.build()))
    }

    fn parse_and_expression(&mut self) -> Result<QueryNode> {
        let mut clauses = vec![self.parse_clause()?];

        loop {
            match self.peek_keyword() {
                Some(Keyword::And) => {
                    self.consume_keyword(Keyword::And);
                    clauses.push(self.parse_clause()?);
                }
                Some(Keyword::Or) => break,
                _ if self.at_operand_start() => clauses.push(self.parse_clause()?),
                _ => break,
            }
        }

        if clauses.len() == 1 && clauses[0].occur == Occur::Must {
            return Ok(clauses.remove(0).query);
        }

        let builder = clauses
            .into_iter()
            .fold(BooleanQueryBuilder::new(), |builder, clause| {
                builder.clause(clause)
            });
        Ok(QueryNode::Boolean(builder.build()))
    }

    fn parse_clause(&mut self) -> Result<BooleanClause> {
        self.skip_whitespace();

        // Check for prefix operators
        let occur = match self.peek_char() {
            Some('+') => {
                self.bump();
                Occur::Must
            }
            Some('-') => {
                self.bump();
                Occur::MustNot
            }
            _ if self.peek_keyword() == Some(Keyword::Not) => {
                self.consume_keyword(Keyword::Not);
                Occur::MustNot
            }
            _ => Occur::Must,
        };

        self.skip_whitespace();
        let query = self.parse_primary()?;
        Ok(BooleanClause::new(query, occur))
    }

    fn parse_primary(&mut self) -> Result<QueryNode> {
        if let Some(keyword) = self.peek_keyword() {
            return Err(self.error(format!("unexpected operator {}", keyword.as_str())));
        }

        match self.peek_char() {
            None => Err(self.error("expected a term but found end of input")),
            Some('(') => {
                self.bump();
                let inner = self.parse_or_expression()?;
                self.expect_close()?;
                Ok(inner)
            }
            Some(')') => Err(self.error("unbalanced ')'")),
            Some('"') => {
                let phrase = self.parse_quoted()?;
                self.default_term(phrase)
            }
            Some(_) => self.parse_field_term(),
        }
    }

    fn parse_field_term(&mut self) -> Result<QueryNode> {
        let first = self.read_token(true);

        if self.peek_char() != Some(':') {
            if first.is_empty() {
                return Err(self.error("expected a term"));
            }
            return self.default_term(first);
        }

        self.bump();
        let field = first;
        if field.is_empty() {
            return Err(self.error("missing field name before ':'"));
        }

        let term = match self.peek_char() {
            Some('"') => self.parse_quoted()?,
            Some('(') => {
                // field group: every bare term inside targets `field`
                self.bump();
                let saved = mem::replace(&mut self.default_field, Some(field));
                let inner = self.parse_or_expression();
                self.default_field = saved;
                let inner = inner?;
                self.expect_close()?;
                return Ok(inner);
            }
            _ => self.read_token(false),
        };

        if term.is_empty() {
            return Err(self.error(format!("missing term for field '{field}'")));
        }
        if field == "*" && term == "*" {
            return Ok(QueryNode::MatchAll);
        }
        Ok(QueryNode::Term(TermQuery::new(field, term)))
    }

    fn default_term(&self, value: String) -> Result<QueryNode> {
        match &self.default_field {
            Some(field) => Ok(QueryNode::Term(TermQuery::new(field.clone(), value))),
            None => Err(self.error(format!(
                "no default field specified and no field prefix found for '{value}'"
            ))),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        // Consume opening quote
        self.bump();

        let mut phrase = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(phrase),
                Some('\\') => match self.bump() {
                    Some(ch) => phrase.push(ch),
                    None => break,
                },
                Some(ch) => phrase.push(ch),
                None => break,
            }
        }
        Err(self.error("unterminated phrase"))
    }

    /// Read a bare token, honoring backslash escapes.
    fn read_token(&mut self, stop_at_colon: bool) -> String {
        let mut token = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || (stop_at_colon && ch == ':') {
                break;
            }
            self.bump();
            if ch == '\\' {
                if let Some(escaped) = self.bump() {
                    token.push(escaped);
                }
            } else {
                token.push(ch);
            }
        }

        token
    }

    fn expect_close(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.bump() == Some(')') {
            Ok(())
        } else {
            Err(self.error("unbalanced '(' (missing ')')"))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) {
        self.pos += keyword.as_str().len();
        self.skip_whitespace();
    }

    fn peek_keyword(&mut self) -> Option<Keyword> {
        self.skip_whitespace();
        let rest = self.rest();

        [Keyword::And, Keyword::Or, Keyword::Not]
            .into_iter()
            .find(|keyword| {
                let word = keyword.as_str();
                rest.starts_with(word)
                    && rest[word.len()..]
                        .chars()
                        .next()
                        .is_none_or(|ch| ch.is_whitespace() || ch == '(')
            })
    }

    fn at_operand_start(&mut self) -> bool {
        self.skip_whitespace();
        matches!(self.peek_char(), Some(ch) if ch != ')')
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error<S: AsRef<str>>(&self, msg: S) -> TrawlError {
        TrawlError::query_parse(format!(
            "{} at position {} in '{}'",
            msg.as_ref(),
            self.pos,
            self.input
        ))
    }
}

/// Builder for creating query parsers.
#[derive(Debug, Default)]
pub struct QueryParserBuilder {
    default_field: Option<String>,
}

impl QueryParserBuilder {
    /// Create a new query parser builder (schema-less).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default field.
    pub fn default_field<S: Into<String>>(mut self, field: S) -> Self {
        self.default_field = Some(field.into());
        self
    }

    /// Build the query parser.
    pub fn build(self) -> QueryParser {
        QueryParser {
            default_field: self.default_field,
        }
    }
}
