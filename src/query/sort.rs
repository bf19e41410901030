//! Sort specifications of the form `field [asc|desc]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrawlError};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Interpret a direction token. Anything starting with `d` is descending.
    pub fn from_token(token: &str) -> Self {
        if token.starts_with(['d', 'D']) {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    /// Create a sort key.
    pub fn new<S: Into<String>>(field: S, order: SortOrder) -> Self {
        SortSpec {
            field: field.into(),
            order,
        }
    }

    /// Parse a single `field [direction]` spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let tokens: Vec<&str> = spec.split_whitespace().collect();
        match tokens.as_slice() {
            [field] => Ok(SortSpec::new(*field, SortOrder::Asc)),
            [field, direction] => Ok(SortSpec::new(*field, SortOrder::from_token(direction))),
            [] => Err(TrawlError::invalid_argument("empty sort specification")),
            _ => Err(TrawlError::invalid_argument(format!(
                "sort specification '{spec}' has more than two tokens"
            ))),
        }
    }

    /// Parse a comma-separated list of specs.
    pub fn parse_list(specs: &str) -> Result<Vec<Self>> {
        specs.split(',').map(|s| SortSpec::parse(s.trim())).collect()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order.as_str())
    }
}
