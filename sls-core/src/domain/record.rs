//! Flattened record types

use serde::{Deserialize, Serialize};

/// One flattened key/value pair of a log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub key: String,
    pub value: String,
}

impl Content {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered key/value pairs derived from a single event
pub type SerializedFields = Vec<Content>;

/// A flush-ready unit: unix timestamp (seconds) plus flattened fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchedRecord {
    pub time: i64,
    pub contents: SerializedFields,
}

impl BatchedRecord {
    pub fn new(time: i64, contents: SerializedFields) -> Self {
        Self { time, contents }
    }

    /// Looks up the value of a field by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.contents
            .iter()
            .find(|content| content.key == key)
            .map(|content| content.value.as_str())
    }
}
