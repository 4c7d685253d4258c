use serde::Serialize;
use std::collections::BTreeMap;

/// A value handed to the template: plain text, or a list for `{% for %}` loops
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MappedValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for MappedValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<Vec<String>> for MappedValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Placeholder name -> value, ready for template substitution
pub type MappedData = BTreeMap<String, MappedValue>;
