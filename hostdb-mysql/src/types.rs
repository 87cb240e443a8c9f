//! Result-set types and value conversion for tenant queries.

use mysql_async::{Row, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A fully buffered result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
    /// Column names in select order.
    pub columns: Vec<String>,
    /// Row values, one inner vector per row.
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryOutput {
    /// Number of buffered rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Convert a row into JSON cells, one per column.
pub fn row_to_json(row: &Row) -> Vec<JsonValue> {
    (0..row.len())
        .map(|idx| row.as_ref(idx).map(to_json).unwrap_or(JsonValue::Null))
        .collect()
}

/// Convert a MySQL value to JSON.
///
/// Byte strings (which is how the text protocol returns every column) become
/// text; bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::NULL => JsonValue::Null,
        Value::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::UInt(u) => JsonValue::Number((*u).into()),
        Value::Float(f) => serde_json::Number::from_f64(f64::from(*f))
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Double(d) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if *micro > 0 {
                text.push_str(&format!(".{:06}", micro));
            }
            JsonValue::String(text)
        }
        Value::Time(is_neg, days, hours, minutes, seconds, micro) => {
            let sign = if *is_neg { "-" } else { "" };
            let mut text = format!(
                "{}{:02}:{:02}:{:02}",
                sign,
                days * 24 + u32::from(*hours),
                minutes,
                seconds
            );
            if *micro > 0 {
                text.push_str(&format!(".{:06}", micro));
            }
            JsonValue::String(text)
        }
    }
}
