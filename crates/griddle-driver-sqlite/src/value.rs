use griddle_core::Value;

use rusqlite::types::{ToSqlOutput, ValueRef};

/// Bridges engine values onto sqlite's storage classes.
pub(crate) struct SqliteValue<'a>(pub &'a Value);

impl rusqlite::types::ToSql for SqliteValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v as i64)),
            Value::I64(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::F64(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            // Structured values should have been collapsed by the column
            // conversions; store the JSON form as a last resort.
            other => ToSqlOutput::Owned(rusqlite::types::Value::Text(other.to_json().to_string())),
        })
    }
}

/// Converts a raw sqlite value into an engine value.
pub(crate) fn from_sql(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::I64(v),
        ValueRef::Real(v) => Value::F64(v),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}
