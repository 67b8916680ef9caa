use rusqlite::Statement;
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::error::SqliteNodeError;
use crate::params::NamedParams;
use crate::types::Record;

/// Convert a `SQLite` column value into its JSON representation.
///
/// REAL values JSON cannot carry (NaN, infinities) become null; BLOBs come
/// back as arrays of byte values.
#[must_use]
pub fn sqlite_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(i),
        Value::Real(f) => {
            serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(bytes) => {
            JsonValue::Array(bytes.into_iter().map(JsonValue::from).collect())
        }
    }
}

/// Run a prepared statement and collect its rows as column-keyed records.
///
/// Column names are captured once from the statement; rows come back in the
/// order the engine produced them.
///
/// # Errors
///
/// Returns `SqliteNodeError::Sqlite` if binding, stepping, or value
/// extraction fails.
pub fn build_records(
    stmt: &mut Statement,
    params: &NamedParams,
) -> Result<Vec<Record>, SqliteNodeError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();

    let param_refs = params.as_refs();
    let mut rows = stmt.query(&param_refs[..])?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::new();
        for (idx, name) in column_names.iter().enumerate() {
            let value: Value = row.get(idx)?;
            record.insert(name.clone(), sqlite_value_to_json(value));
        }
        records.push(record);
    }

    Ok(records)
}
