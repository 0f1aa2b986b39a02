use griddle_core::Value;

use postgres::types::{ToSql, Type};

/// Converts an engine value into an owned postgres parameter.
pub(crate) fn to_param(value: &Value) -> Box<dyn ToSql + Sync> {
    match value {
        Value::Null => Box::new(Option::<String>::None),
        Value::Bool(v) => Box::new(*v),
        Value::I64(v) => Box::new(*v),
        Value::F64(v) => Box::new(*v),
        Value::String(s) => Box::new(s.clone()),
        Value::Bytes(b) => Box::new(b.clone()),
        // Structured values should have been collapsed by the column
        // conversions; ship the JSON form as a last resort.
        other => Box::new(other.to_json().to_string()),
    }
}

/// Converts one column of a result row into an engine value.
pub(crate) fn from_column(row: &postgres::Row, index: usize) -> Value {
    let ty = row.columns()[index].type_();

    if *ty == Type::BOOL {
        row.get::<_, Option<bool>>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null)
    } else if *ty == Type::INT2 {
        row.get::<_, Option<i16>>(index)
            .map(|v| Value::I64(v as i64))
            .unwrap_or(Value::Null)
    } else if *ty == Type::INT4 {
        row.get::<_, Option<i32>>(index)
            .map(|v| Value::I64(v as i64))
            .unwrap_or(Value::Null)
    } else if *ty == Type::INT8 {
        row.get::<_, Option<i64>>(index)
            .map(Value::I64)
            .unwrap_or(Value::Null)
    } else if *ty == Type::FLOAT4 {
        row.get::<_, Option<f32>>(index)
            .map(|v| Value::F64(v as f64))
            .unwrap_or(Value::Null)
    } else if *ty == Type::FLOAT8 {
        row.get::<_, Option<f64>>(index)
            .map(Value::F64)
            .unwrap_or(Value::Null)
    } else if *ty == Type::BYTEA {
        row.get::<_, Option<Vec<u8>>>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null)
    } else {
        row.try_get::<_, Option<String>>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null)
    }
}
