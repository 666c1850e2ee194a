use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the path of the file a unit was loaded from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding a 1-based page (or slide) number.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding a URL the content originated from.
pub const URL_KEY: &str = "url";

/// Ordered metadata map. Ordering keeps serialized snapshots byte-stable
/// across runs over the same input.
pub type Metadata = BTreeMap<String, FieldValue>;

/// One raw parsed unit from a source file (a page, a CSV row, a whole file...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub text: String,
    pub metadata: Metadata,
}

impl DocumentUnit {
    /// Create a unit whose metadata only carries `source`.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), FieldValue::Text(source.into()));
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(FieldValue::as_str)
    }
}

/// Scalar metadata value. Loaders produce text and integers; the other
/// variants exist so snapshots written by custom loaders stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FieldValue {
    /// Extract as string, returning None for non-text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}
