//! Property value types for result items.
//!
//! Every property is logically multi-valued; a [`PropertyValue`] is one element
//! of that collection.
//!
//! ```
//! use trawl::result::property_value::PropertyValue;
//!
//! let text = PropertyValue::from("hello");
//! assert_eq!(text.as_text(), Some("hello"));
//!
//! let number = PropertyValue::Integer(42);
//! assert_eq!(number.to_term_string(), "42");
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// DateTime value
    DateTime(DateTime<Utc>),
    /// Text value
    Text(String),
}

impl PropertyValue {
    /// Convert to text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            PropertyValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Some(true),
                "false" | "no" | "0" | "off" => Some(false),
                _ => None,
            },
            PropertyValue::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Convert to a timestamp if this is (or parses as) a datetime.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::DateTime(dt) => Some(*dt),
            PropertyValue::Text(s) => s.parse::<DateTime<Utc>>().ok(),
            _ => None,
        }
    }

    /// Canonical string form used when comparing against query terms.
    pub fn to_term_string(&self) -> String {
        match self {
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::DateTime(dt) => dt.to_rfc3339(),
            PropertyValue::Text(s) => s.clone(),
        }
    }

    /// Ordering used for sorting: numbers numerically, datetimes
    /// chronologically, everything else by term string.
    pub fn compare(&self, other: &PropertyValue) -> Ordering {
        match (self, other) {
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a.cmp(b),
            (PropertyValue::Integer(a), PropertyValue::Float(b)) => (*a as f64).total_cmp(b),
            (PropertyValue::Float(a), PropertyValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.total_cmp(b),
            (PropertyValue::DateTime(a), PropertyValue::DateTime(b)) => a.cmp(b),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a.cmp(b),
            _ => self.to_term_string().cmp(&other.to_term_string()),
        }
    }
}

/// Compare two optional sort keys; missing values sort last.
pub fn compare_sort_keys(a: Option<&PropertyValue>, b: Option<&PropertyValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_term_strings() {
        assert_eq!(PropertyValue::from(true).to_term_string(), "true");
        assert_eq!(PropertyValue::from(1.5).to_term_string(), "1.5");
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap();
        assert_eq!(
            PropertyValue::from(dt).to_term_string(),
            "2024-01-15T08:30:00+00:00"
        );
    }

    #[test]
    fn test_compare() {
        assert_eq!(
            PropertyValue::Integer(2).compare(&PropertyValue::Integer(10)),
            Ordering::Less
        );
        assert_eq!(
            PropertyValue::Float(2.5).compare(&PropertyValue::Integer(2)),
            Ordering::Greater
        );
        assert_eq!(
            PropertyValue::from("b").compare(&PropertyValue::from("a")),
            Ordering::Greater
        );
        assert_eq!(
            compare_sort_keys(Some(&PropertyValue::Integer(1)), None),
            Ordering::Less
        );
    }

    #[test]
    fn test_boolean_inference() {
        assert_eq!(PropertyValue::from("yes").as_boolean(), Some(true));
        assert_eq!(PropertyValue::from("off").as_boolean(), Some(false));
        assert_eq!(PropertyValue::from("maybe").as_boolean(), None);
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<PropertyValue> =
            serde_json::from_str(r#"["doc", 3, 2.5, false]"#).unwrap();
        assert_eq!(
            values,
            vec![
                PropertyValue::from("doc"),
                PropertyValue::Integer(3),
                PropertyValue::Float(2.5),
                PropertyValue::Boolean(false),
            ]
        );
    }
}
