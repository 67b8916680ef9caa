use rusqlite::ToSql;
use rusqlite::types::Value;
use serde_json::{Map, Value as JsonValue};

/// Convert a single JSON argument into a `SQLite` value.
///
/// Booleans map to 0/1 the way `SQLite` stores them; structured values
/// (arrays, objects) are serialized to TEXT.
#[must_use]
pub fn json_to_sqlite_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Named `SQLite` parameter container.
///
/// Keys keep the prefix the user wrote (`$x`, `:x`, `@x`), which is how the
/// engine resolves them.
#[derive(Debug, Clone)]
pub struct NamedParams(pub Vec<(String, Value)>);

impl NamedParams {
    /// Convert filtered JSON arguments into named `SQLite` values.
    #[must_use]
    pub fn convert(arguments: &Map<String, JsonValue>) -> Self {
        Self(
            arguments
                .iter()
                .map(|(key, value)| (key.clone(), json_to_sqlite_value(value)))
                .collect(),
        )
    }

    /// Borrowed view suitable for rusqlite binding.
    #[must_use]
    pub fn as_refs(&self) -> Vec<(&str, &dyn ToSql)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value as &dyn ToSql))
            .collect()
    }
}
