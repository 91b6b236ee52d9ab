// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal log records and their line encoding
//!
//! A record is a schema-free JSON object. Records carry no sequence field:
//! a record's log number is its 0-based position in commit order.
//!
//! On line-oriented backends each record occupies exactly one line of
//! compact JSON terminated by `\n`, with object keys in sorted order so the
//! same record always encodes to the same bytes. JSON escapes control characters inside
//! strings, so an encoded record never contains a raw line break.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Position of a record in the global append order
pub type LogNumber = u64;

/// Errors building or decoding a record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("log record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One immutable entry in the journal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The record's operation name, read from `op` or `op_code`
    pub fn op(&self) -> Option<&Value> {
        self.0.get("op").or_else(|| self.0.get("op_code"))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Serialize to a single line of compact JSON, without the terminator
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Parse a single line (terminator optional)
    pub fn from_line(line: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(line.trim_end_matches(['\n', '\r']))?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for LogRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(RecordError::NotAnObject("null")),
            Value::Bool(_) => Err(RecordError::NotAnObject("bool")),
            Value::Number(_) => Err(RecordError::NotAnObject("number")),
            Value::String(_) => Err(RecordError::NotAnObject("string")),
            Value::Array(_) => Err(RecordError::NotAnObject("array")),
        }
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<LogRecord> for Value {
    fn from(record: LogRecord) -> Self {
        Value::Object(record.0)
    }
}

/// Encode a batch as newline-terminated lines, ready for a single write
pub fn encode_batch(logs: &[LogRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    for log in logs {
        serde_json::to_writer(&mut buf, log.as_map())?;
        buf.push(b'\n');
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
