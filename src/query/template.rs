//! Query templates with `{name}` and `{name|default}` placeholders.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::error::{Result, TrawlError};
use crate::query::search_query::Query;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{([A-Za-z0-9_.\-]+)(?:\|([^}]*))?\}").expect("placeholder pattern is valid");
}

/// A query string with named placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    template: String,
}

impl QueryTemplate {
    /// Create a template.
    pub fn new<S: Into<String>>(template: S) -> Self {
        QueryTemplate {
            template: template.into(),
        }
    }

    /// Get the raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Names of every placeholder, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Substitute placeholders from `properties`.
    ///
    /// A placeholder with neither a value nor a default is missing; all
    /// missing names are reported together.
    pub fn resolve(&self, properties: &BTreeMap<String, String>) -> Result<String> {
        let mut missing = Vec::new();
        let resolved = substitute(&self.template, properties, &mut missing);
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(TrawlError::MissingParameter(missing))
        }
    }

    /// Resolve this template and the option values into a [`Query`].
    pub fn resolve_query(
        &self,
        properties: &BTreeMap<String, String>,
        options: &BTreeMap<String, String>,
        name: Option<&str>,
        query_type: &str,
    ) -> Result<Query> {
        let mut missing = Vec::new();
        let query_string = substitute(&self.template, properties, &mut missing);
        let options: BTreeMap<String, String> = options
            .iter()
            .map(|(k, v)| (k.clone(), substitute(v, properties, &mut missing)))
            .collect();

        if !missing.is_empty() {
            return Err(TrawlError::MissingParameter(missing));
        }

        let mut builder = Query::builder(query_string)
            .options(options)
            .query_type(query_type);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        Ok(builder.build())
    }
}

fn substitute(
    text: &str,
    properties: &BTreeMap<String, String>,
    missing: &mut Vec<String>,
) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            match (properties.get(name), caps.get(2)) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    String::new()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve() {
        let template = QueryTemplate::new("resourceType:{type} AND tag:{tag|public}");
        let resolved = template.resolve(&props(&[("type", "doc")])).unwrap();
        assert_eq!(resolved, "resourceType:doc AND tag:public");
    }

    #[test]
    fn test_value_overrides_default() {
        let template = QueryTemplate::new("tag:{tag|public}");
        let resolved = template.resolve(&props(&[("tag", "x")])).unwrap();
        assert_eq!(resolved, "tag:x");
    }

    #[test]
    fn test_empty_default() {
        let template = QueryTemplate::new("q:x{suffix|}");
        assert_eq!(template.resolve(&props(&[])).unwrap(), "q:x");
    }

    #[test]
    fn test_missing_parameters_reported_together() {
        let template = QueryTemplate::new("a:{a} AND b:{b} AND c:{a}");
        let err = template.resolve(&props(&[])).unwrap_err();
        match err {
            TrawlError::MissingParameter(names) => assert_eq!(names, vec!["a", "b"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_placeholders() {
        let template = QueryTemplate::new("a:{a} AND b:{b|x}");
        assert_eq!(template.placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_query() {
        let template = QueryTemplate::new("owner:{userid}");
        let options = props(&[("sort", "{sortOn|created} desc")]);
        let query = template
            .resolve_query(&props(&[("userid", "alice")]), &options, Some("mine"), "store")
            .unwrap();

        assert_eq!(query.query_string(), "owner:alice");
        assert_eq!(query.option("sort"), Some("created desc"));
        assert_eq!(query.name(), Some("mine"));
        assert_eq!(query.query_type(), "store");
    }

    #[test]
    fn test_resolve_query_missing_in_options() {
        let template = QueryTemplate::new("*:*");
        let options = props(&[("sort", "{sortOn}")]);
        let err = template
            .resolve_query(&props(&[]), &options, None, "fulltext")
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
