use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A storable value.
///
/// Columns convert between these variants and their in-memory shapes: plain
/// scalars, related-record identities (`Reference`), related records loaded
/// from storage (`Record`) and collections (`List`). The set is closed so the
/// store/restore contract stays statically checkable.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit floating point
    F64(f64),

    /// String value
    String(String),

    /// Raw binary value
    Bytes(Vec<u8>),

    /// A list of values
    List(Vec<Value>),

    /// The identity of a related record
    Reference { entity: String, id: Box<Value> },

    /// A related record already loaded from storage. Accessing it never
    /// issues a fresh query.
    Record {
        entity: String,
        values: BTreeMap<String, Value>,
    },
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value counts as "null" for validation purposes.
    ///
    /// Empty strings, lists and records are null-like; `Bool(false)` is NOT.
    pub fn is_null_like(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => false,
            Self::String(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Record { values, .. } => values.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The identity carried by this value, when it has one.
    ///
    /// References yield their id, loaded records their `id` column value.
    pub fn id(&self) -> Option<&Value> {
        match self {
            Self::Reference { id, .. } => Some(id),
            Self::Record { values, .. } => values.get("id"),
            _ => None,
        }
    }

    /// Converts a JSON document value into a [`Value`].
    pub fn from_json(src: &serde_json::Value) -> Self {
        match src {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(*v),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::I64(v)
                } else {
                    Self::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                // An embedded record payload without entity tagging.
                let values = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect();
                Self::Record {
                    entity: String::new(),
                    values,
                }
            }
        }
    }

    /// Converts this value into its JSON document representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::I64(v) => serde_json::Value::from(*v),
            Self::F64(v) => serde_json::Value::from(*v),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            ),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Reference { id, .. } => id.to_json(),
            Self::Record { values, .. } => serde_json::Value::Object(
                values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

// `Eq` is implemented manually because `F64` only derives `PartialEq`.
// Float values never act as record identities, so the NaN caveat does not
// reach cache keys.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::F64(v) => v.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::List(items) => items.hash(state),
            Self::Reference { entity, id } => {
                entity.hash(state);
                id.hash(state);
            }
            Self::Record { entity, values } => {
                entity.hash(state);
                values.hash(state);
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn false_is_not_null_like() {
        assert!(Value::Null.is_null_like());
        assert!(Value::String(String::new()).is_null_like());
        assert!(Value::List(vec![]).is_null_like());
        assert!(!Value::Bool(false).is_null_like());
        assert!(!Value::I64(0).is_null_like());
    }

    #[test]
    fn reference_id() {
        let value = Value::Reference {
            entity: "User".into(),
            id: Box::new(Value::I64(7)),
        };
        assert_eq!(value.id(), Some(&Value::I64(7)));
    }

    #[test]
    fn json_round_trip() {
        let value = Value::List(vec![Value::I64(1), Value::String("two".into())]);
        assert_eq!(Value::from_json(&value.to_json()), value);
    }
}
