use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::error::{Result, SafeDeleteError};


/// One stored row, keyed by column name.
pub type Record = Map<String, Value>;


pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SafeDeleteError::NotARecord(other.to_string())),
    }
}

pub fn from_record<T: DeserializeOwned>(record: &Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record.clone()))?)
}

/// Stable string form of a value, used to key rows and group related records.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deleted-marker value for "now".
///
/// Microsecond precision keeps markers written in the same cascade byte-identical.
pub fn now_marker() -> (DateTime<Utc>, Value) {
    let now = Utc::now();
    let marker = Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true));
    (now, marker)
}

pub fn parse_marker(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
