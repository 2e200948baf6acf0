//! Metric model
//!
//! A [`Metric`] is what the receiver hands to its sink for every parsed
//! message: a measurement name, string tags, typed fields and the emission
//! timestamp assigned by the receiver (not the one inside the message).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Measurement name used for every syslog metric
pub const MEASUREMENT: &str = "syslog";

/// A typed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// UTF-8 string
    Str(String),
    /// Boolean
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

/// Tag set
pub type Tags = BTreeMap<String, String>;

/// Field set
pub type Fields = BTreeMap<String, FieldValue>;

/// One emitted measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    /// Measurement name
    pub name: &'static str,

    /// String-valued tags
    pub tags: Tags,

    /// Typed fields
    pub fields: Fields,

    /// Emission timestamp
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    /// Create a metric under the syslog measurement
    pub fn new(tags: Tags, fields: Fields, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: MEASUREMENT,
            tags,
            fields,
            timestamp,
        }
    }

    /// Look up a tag
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up a field
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}
