//! Error types for the trawl library.
//!
//! All errors are represented by the [`TrawlError`] enum. Whole-query failures
//! are returned from `execute`; item-level failures (a single unreadable or
//! vanished item) are carried inside result iteration instead, see
//! [`TrawlError::is_item_level`].
//!
//! # Examples
//!
//! ```
//! use trawl::error::{Result, TrawlError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TrawlError::query_parse("unbalanced parenthesis"))
//! }
//!
//! let err = example_operation().unwrap_err();
//! assert_eq!(err.status_code(), 500);
//! ```

use std::io;

use thiserror::Error;

/// The main error type for trawl operations.
#[derive(Error, Debug)]
pub enum TrawlError {
    /// A required template variable had no value and no default.
    #[error("Missing parameter(s): {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    /// The query string could not be parsed or decomposed.
    #[error("Query parse error: {0}")]
    QueryParse(String),

    /// Transport or storage failure reported by a backend client.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The content store refused access to the item at this path.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The item at this path disappeared between the scan and the read.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No adapter is registered for the requested backend type.
    #[error("Unknown backend type: {0}")]
    UnknownBackendType(String),

    /// A caller supplied an unusable argument (page request, option value).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Engine configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `try_next` was called on an exhausted iterator.
    #[error("Iterator exhausted at position {0}")]
    Exhausted(u64),

    /// I/O errors (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors raised by backend clients written against `anyhow`.
    #[error("Backend unavailable: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TrawlError.
pub type Result<T> = std::result::Result<T, TrawlError>;

impl TrawlError {
    /// Create a new missing parameter error for a single name.
    pub fn missing_parameter<S: Into<String>>(name: S) -> Self {
        TrawlError::MissingParameter(vec![name.into()])
    }

    /// Create a new query parse error.
    pub fn query_parse<S: Into<String>>(msg: S) -> Self {
        TrawlError::QueryParse(msg.into())
    }

    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        TrawlError::BackendUnavailable(msg.into())
    }

    /// Create a new access denied error.
    pub fn access_denied<S: Into<String>>(msg: S) -> Self {
        TrawlError::AccessDenied(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        TrawlError::NotFound(msg.into())
    }

    /// Create a new unknown backend type error.
    pub fn unknown_backend<S: Into<String>>(backend: S) -> Self {
        TrawlError::UnknownBackendType(backend.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TrawlError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        TrawlError::InvalidConfig(msg.into())
    }

    /// HTTP-style status the servlet layer should surface for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            TrawlError::MissingParameter(_) | TrawlError::InvalidArgument(_) => 400,
            TrawlError::AccessDenied(_) => 403,
            TrawlError::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether a result-processing loop may skip the offending item and continue.
    pub fn is_item_level(&self) -> bool {
        matches!(self, TrawlError::AccessDenied(_) | TrawlError::NotFound(_))
    }

    /// Path of the offending item, for item-level errors.
    pub fn item_path(&self) -> Option<&str> {
        match self {
            TrawlError::AccessDenied(path) | TrawlError::NotFound(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TrawlError::query_parse("Test parse error");
        assert_eq!(error.to_string(), "Query parse error: Test parse error");

        let error = TrawlError::unknown_backend("solr");
        assert_eq!(error.to_string(), "Unknown backend type: solr");

        let error = TrawlError::MissingParameter(vec!["q".to_string(), "tag".to_string()]);
        assert_eq!(error.to_string(), "Missing parameter(s): q, tag");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TrawlError::missing_parameter("q").status_code(), 400);
        assert_eq!(TrawlError::invalid_argument("page").status_code(), 400);
        assert_eq!(TrawlError::access_denied("/a").status_code(), 403);
        assert_eq!(TrawlError::query_parse("x").status_code(), 500);
        assert_eq!(TrawlError::backend("down").status_code(), 500);
        assert_eq!(TrawlError::unknown_backend("x").status_code(), 500);
    }

    #[test]
    fn test_item_level() {
        assert!(TrawlError::access_denied("/a").is_item_level());
        assert!(TrawlError::not_found("/a").is_item_level());
        assert!(!TrawlError::backend("down").is_item_level());
    }

    #[test]
    fn test_item_path() {
        assert_eq!(TrawlError::access_denied("/a").item_path(), Some("/a"));
        assert_eq!(TrawlError::not_found("/b").item_path(), Some("/b"));
        assert_eq!(TrawlError::backend("/c").item_path(), None);
    }

    #[test]
    fn test_anyhow_conversion() {
        let err = TrawlError::from(anyhow::anyhow!("connection reset"));
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("connection reset"));
    }
}
