use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ServiceError;
use crate::parser::coercion::{coerce, ConfigValue};

/// One upstream row as returned by the values API: column A is the key, column B the value.
pub type Row = Vec<Value>;

/// Result of converting a full row set.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub entries: BTreeMap<String, ConfigValue>,
    /// rows that were skipped because their key cell was unusable
    pub skipped: Vec<ServiceError>,
}

/// Convert rows top to bottom. A later row overwrites an earlier one with the same key.
pub fn parse_rows(rows: &[Row]) -> ParsedRows {
    let mut parsed = ParsedRows::default();
    for (index, row) in rows.iter().enumerate() {
        match entry_from_row(index, row) {
            Ok(Some((key, value))) => {
                parsed.entries.insert(key, value);
            }
            Ok(None) => {}
            Err(err) => parsed.skipped.push(err),
        }
    }
    parsed
}

/// `Ok(None)` for a row with no cells, `MalformedRow` when the key cell is not a scalar.
pub fn entry_from_row(index: usize, row: &[Value]) -> Result<Option<(String, ConfigValue)>, ServiceError> {
    let Some(key_cell) = row.first() else {
        return Ok(None);
    };
    let key = match key_cell {
        Value::String(s) => s.to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => {
            return Err(ServiceError::MalformedRow {
                row: index,
                reason: "key cell is null".to_owned(),
            })
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(ServiceError::MalformedRow {
                row: index,
                reason: "key cell is not a scalar".to_owned(),
            })
        }
    };

    let raw = row.get(1).map(cell_text).unwrap_or_default();
    Ok(Some((key, coerce(&raw))))
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.to_owned(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
