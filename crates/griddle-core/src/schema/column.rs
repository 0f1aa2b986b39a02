use super::{ColumnFlag, ColumnFlags, ColumnType, ColumnTypeRegistry, Direction};
use crate::{Error, Result, Syntax, Value};

use std::time::Duration;

/// Binds a column to a named index with its cache policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBinding {
    pub name: String,
    pub cached: bool,
    pub timeout: Option<Duration>,
}

/// What happens to referencing records when the referenced record is
/// deleted. Enforced at delete time by the execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveAction {
    DoNothing,
    Cascade,
    #[default]
    Block,
}

impl RemoveAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::DoNothing => "DoNothing",
            Self::Cascade => "Cascade",
            Self::Block => "Block",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DoNothing" => Some(Self::DoNothing),
            "Cascade" => Some(Self::Cascade),
            "Block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// The back-relation exposed on the referenced entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseDescriptor {
    pub name: String,
    pub cached: bool,
    pub timeout: Option<Duration>,
}

/// Relational semantics for a reference column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Name of the referenced entity.
    pub entity: String,
    pub on_remove: RemoveAction,
    pub reverse: Option<ReverseDescriptor>,
}

/// Meta information for one mapped attribute of an entity.
///
/// Constructed once per entity type at schema-definition time; identity is
/// immutable afterwards except through the explicit setters used during
/// schema assembly.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    field: Option<String>,
    ty: ColumnType,
    type_name: String,
    flags: ColumnFlags,
    default: Option<Value>,
    index: Option<IndexBinding>,
    default_order: Direction,
    reference: Option<Reference>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            field: None,
            ty,
            type_name: ty.name().to_string(),
            flags: ColumnFlags::EMPTY,
            default: None,
            index: None,
            default_order: Direction::Asc,
            reference: None,
        }
    }

    /// A reference column pointing at `entity`.
    pub fn reference(name: impl Into<String>, entity: impl Into<String>) -> Self {
        let mut column = Self::new(name, ColumnType::Reference);
        column.reference = Some(Reference {
            entity: entity.into(),
            on_remove: RemoveAction::default(),
            reverse: None,
        });
        column
    }

    /// The standard identity column: primary auto-incrementing `id`.
    pub fn id() -> Self {
        Self::new("id", ColumnType::Id)
            .with_flag(ColumnFlag::Primary)
            .with_flag(ColumnFlag::AutoIncrement)
            .with_flag(ColumnFlag::Required)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_flag(mut self, flag: ColumnFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_index(mut self, index: IndexBinding) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_default_order(mut self, order: Direction) -> Self {
        self.default_order = order;
        self
    }

    pub fn with_remove_action(mut self, action: RemoveAction) -> Self {
        if let Some(reference) = &mut self.reference {
            reference.on_remove = action;
        }
        self
    }

    pub fn with_reverse(mut self, reverse: ReverseDescriptor) -> Self {
        if let Some(reference) = &mut self.reference {
            reference.reverse = Some(reverse);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn flags(&self) -> ColumnFlags {
        self.flags
    }

    pub fn flag(&self, flag: ColumnFlag) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: ColumnFlag, state: bool) {
        if state {
            self.flags.insert(flag);
        } else {
            self.flags.remove(flag);
        }
    }

    pub fn index(&self) -> Option<&IndexBinding> {
        self.index.as_ref()
    }

    pub fn default_order(&self) -> Direction {
        self.default_order
    }

    pub fn reference_info(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_translatable(&self) -> bool {
        self.flags.contains(ColumnFlag::Translatable)
    }

    pub fn is_virtual(&self) -> bool {
        self.flags.contains(ColumnFlag::Virtual)
    }

    /// The default value, with string-encoded defaults coerced through the
    /// column type.
    pub fn default(&self) -> Option<Value> {
        match &self.default {
            Some(Value::String(s)) => Some(self.value_from_string(s)),
            other => other.clone(),
        }
    }

    /// The physical column name: the explicit override, or the naming policy
    /// applied to the logical name (`_id`-suffixed for references).
    pub fn field(&self, syntax: &dyn Syntax) -> String {
        match &self.field {
            Some(field) => field.clone(),
            None => syntax.field(&self.name, self.is_reference()),
        }
    }

    /// The physical storage type on the given backend.
    pub fn db_type(&self, types: &ColumnTypeRegistry, backend: &str) -> Result<String> {
        types.db_type(&self.type_name, backend)
    }

    /// Validates a value against this column's rules.
    ///
    /// A Required column without AutoIncrement rejects null-like values.
    /// `false` is a real boolean, never null.
    pub fn validate(&self, value: &Value) -> Result<()> {
        if self.flags.contains(ColumnFlag::Required)
            && !self.flags.contains(ColumnFlag::AutoIncrement)
            && value.is_null_like()
        {
            return Err(Error::column_validation(
                &self.name,
                format!("{} is a required column", self.name),
            ));
        }
        Ok(())
    }

    /// Coerces a string into a value of this column's type. Unparseable
    /// input stays a string.
    pub fn value_from_string(&self, src: &str) -> Value {
        match self.ty {
            ColumnType::Boolean => match src {
                "true" | "True" | "1" => Value::Bool(true),
                "false" | "False" | "0" => Value::Bool(false),
                _ => Value::String(src.to_string()),
            },
            ColumnType::Id | ColumnType::Integer | ColumnType::Long | ColumnType::Reference => {
                src.parse::<i64>()
                    .map(Value::I64)
                    .unwrap_or_else(|_| Value::String(src.to_string()))
            }
            ColumnType::Float => src
                .parse::<f64>()
                .map(Value::F64)
                .unwrap_or_else(|_| Value::String(src.to_string())),
            _ => Value::String(src.to_string()),
        }
    }

    /// Converts an in-memory value to the shape kept on a record.
    pub fn store(&self, value: Value) -> Value {
        match value {
            Value::String(s) => self.value_from_string(&s),
            other => other,
        }
    }

    /// Converts a record value to its primitive storable form: collections
    /// recursively, related records and references to their ids.
    pub fn db_store(&self, value: Value) -> Value {
        match value {
            Value::List(items) => {
                Value::List(items.into_iter().map(|item| self.db_store(item)).collect())
            }
            Value::Reference { id, .. } => *id,
            record @ Value::Record { .. } => {
                record.id().cloned().unwrap_or(Value::Null)
            }
            other => other,
        }
    }

    /// Converts a raw database value back to its record shape.
    pub fn db_restore(&self, value: Value) -> Value {
        match (self.ty, value) {
            (ColumnType::Boolean, Value::I64(v)) => Value::Bool(v != 0),
            (_, value) => value,
        }
    }

    /// Extracts a loaded database value, inflating reference identities and
    /// embedded payloads into related-record values.
    pub fn extract(&self, value: Value) -> Result<Value> {
        let Some(reference) = &self.reference else {
            return Ok(self.db_restore(value));
        };

        let value = match value {
            Value::String(s) if s.starts_with('{') => {
                let parsed: serde_json::Value = serde_json::from_str(&s)
                    .map_err(|_| Error::configuration("invalid reference payload"))?;
                Value::from_json(&parsed)
            }
            other => other,
        };

        match value {
            Value::Null => Ok(Value::Null),
            Value::Record { values, .. } => Ok(Value::Record {
                entity: reference.entity.clone(),
                values,
            }),
            id => Ok(Value::Reference {
                entity: reference.entity.clone(),
                id: Box::new(id),
            }),
        }
    }

    /// Builds a column from a JSON schema document, resolving the concrete
    /// type through the registry.
    pub fn from_json(types: &ColumnTypeRegistry, jdata: &serde_json::Value) -> Result<Self> {
        let type_name = jdata
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::invalid_column_type("<missing>"))?;
        let entry = types.resolve(type_name)?;

        let name = jdata
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::configuration("column definition is missing `name`"))?;

        let mut column = Self::new(name, entry.base);
        column.type_name = type_name.to_string();

        if let Some(field) = jdata.get("field").and_then(|v| v.as_str()) {
            column.field = Some(field.to_string());
        }
        if let Some(flags) = jdata.get("flags").and_then(|v| v.as_array()) {
            column.flags = ColumnFlags::from_names(flags.iter().filter_map(|f| f.as_str()));
        }
        if let Some(default) = jdata.get("default") {
            if !default.is_null() {
                column.default = Some(Value::from_json(default));
            }
        }
        if let Some(order) = jdata.get("defaultOrder").and_then(|v| v.as_str()) {
            column.default_order = match order {
                "desc" => Direction::Desc,
                _ => Direction::Asc,
            };
        }
        if let Some(index) = jdata.get("index").and_then(|v| v.as_object()) {
            column.index = Some(IndexBinding {
                name: index
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                cached: index.get("cached").and_then(|v| v.as_bool()).unwrap_or(false),
                timeout: index
                    .get("timeout")
                    .and_then(|v| v.as_u64())
                    .map(Duration::from_secs),
            });
        }
        if let Some(entity) = jdata.get("reference").and_then(|v| v.as_str()) {
            let on_remove = jdata
                .get("removeAction")
                .and_then(|v| v.as_str())
                .and_then(RemoveAction::from_name)
                .unwrap_or_default();
            let reverse = jdata
                .get("reverse")
                .and_then(|v| v.as_object())
                .map(|reverse| ReverseDescriptor {
                    name: reverse
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    cached: reverse
                        .get("cached")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false),
                    timeout: reverse
                        .get("timeout")
                        .and_then(|v| v.as_u64())
                        .map(Duration::from_secs),
                });
            column.reference = Some(Reference {
                entity: entity.to_string(),
                on_remove,
                reverse,
            });
        }

        Ok(column)
    }

    /// Serializes this column back to the JSON schema document shape.
    pub fn to_json(&self) -> serde_json::Value {
        let mut jdata = serde_json::Map::new();
        jdata.insert("name".into(), self.name.clone().into());
        jdata.insert("type".into(), self.type_name.clone().into());
        if let Some(field) = &self.field {
            jdata.insert("field".into(), field.clone().into());
        }
        if !self.flags.is_empty() {
            jdata.insert(
                "flags".into(),
                serde_json::Value::Array(
                    self.flags.names().into_iter().map(Into::into).collect(),
                ),
            );
        }
        if let Some(default) = &self.default {
            jdata.insert("default".into(), default.to_json());
        }
        if self.default_order == Direction::Desc {
            jdata.insert("defaultOrder".into(), "desc".into());
        }
        if let Some(index) = &self.index {
            let mut jindex = serde_json::Map::new();
            jindex.insert("name".into(), index.name.clone().into());
            jindex.insert("cached".into(), index.cached.into());
            if let Some(timeout) = index.timeout {
                jindex.insert("timeout".into(), timeout.as_secs().into());
            }
            jdata.insert("index".into(), serde_json::Value::Object(jindex));
        }
        if let Some(reference) = &self.reference {
            jdata.insert("reference".into(), reference.entity.clone().into());
            jdata.insert("removeAction".into(), reference.on_remove.name().into());
            if let Some(reverse) = &reference.reverse {
                let mut jreverse = serde_json::Map::new();
                jreverse.insert("name".into(), reverse.name.clone().into());
                jreverse.insert("cached".into(), reverse.cached.into());
                if let Some(timeout) = reverse.timeout {
                    jreverse.insert("timeout".into(), timeout.as_secs().into());
                }
                jdata.insert("reverse".into(), serde_json::Value::Object(jreverse));
            }
        }
        serde_json::Value::Object(jdata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SnakeSyntax;

    #[test]
    fn required_rejects_null_like() {
        let column = Column::new("name", ColumnType::Text).with_flag(ColumnFlag::Required);

        assert!(column.validate(&Value::Null).is_err());
        assert!(column.validate(&Value::String(String::new())).is_err());
        assert!(column.validate(&Value::String("ok".into())).is_ok());
    }

    #[test]
    fn false_passes_required_validation() {
        let column = Column::new("active", ColumnType::Boolean).with_flag(ColumnFlag::Required);
        assert!(column.validate(&Value::Bool(false)).is_ok());
    }

    #[test]
    fn auto_increment_skips_required_check() {
        let column = Column::id();
        assert!(column.validate(&Value::Null).is_ok());
    }

    #[test]
    fn validation_error_names_the_column() {
        let column = Column::new("title", ColumnType::Text).with_flag(ColumnFlag::Required);
        let err = column.validate(&Value::Null).unwrap_err();
        assert!(err.is_column_validation());
        assert_eq!(err.column(), Some("title"));
    }

    #[test]
    fn field_resolution() {
        let syntax = SnakeSyntax;

        let plain = Column::new("firstName", ColumnType::Text);
        assert_eq!(plain.field(&syntax), "first_name");

        let reference = Column::reference("createdBy", "User");
        assert_eq!(reference.field(&syntax), "created_by_id");

        let explicit = Column::new("firstName", ColumnType::Text).with_field("fname");
        assert_eq!(explicit.field(&syntax), "fname");
    }

    #[test]
    fn db_store_collapses_relations() {
        let column = Column::reference("createdBy", "User");

        let reference = Value::Reference {
            entity: "User".into(),
            id: Box::new(Value::I64(3)),
        };
        assert_eq!(column.db_store(reference), Value::I64(3));

        let list = Value::List(vec![
            Value::Reference {
                entity: "User".into(),
                id: Box::new(Value::I64(1)),
            },
            Value::Reference {
                entity: "User".into(),
                id: Box::new(Value::I64(2)),
            },
        ]);
        assert_eq!(
            column.db_store(list),
            Value::List(vec![Value::I64(1), Value::I64(2)])
        );
    }

    #[test]
    fn extract_inflates_references() {
        let column = Column::reference("createdBy", "User");

        let inflated = column.extract(Value::I64(9)).unwrap();
        assert_eq!(
            inflated,
            Value::Reference {
                entity: "User".into(),
                id: Box::new(Value::I64(9)),
            }
        );

        let embedded = column
            .extract(Value::String("{\"id\": 9, \"name\": \"bob\"}".into()))
            .unwrap();
        match embedded {
            Value::Record { entity, values } => {
                assert_eq!(entity, "User");
                assert_eq!(values.get("id"), Some(&Value::I64(9)));
            }
            other => panic!("expected a loaded record, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip() {
        let types = ColumnTypeRegistry::with_builtins();
        let column = Column::reference("createdBy", "User")
            .with_flag(ColumnFlag::Required)
            .with_default(Value::I64(1))
            .with_index(IndexBinding {
                name: "by_created_by".into(),
                cached: true,
                timeout: Some(Duration::from_secs(60)),
            });

        let restored = Column::from_json(&types, &column.to_json()).unwrap();
        assert_eq!(restored.name(), column.name());
        assert_eq!(restored.type_name(), column.type_name());
        assert_eq!(restored.flags(), column.flags());
        assert_eq!(restored.default(), column.default());
        assert_eq!(restored.index(), column.index());
        assert_eq!(restored.reference_info(), column.reference_info());
    }

    #[test]
    fn unregistered_type_name_fails() {
        let types = ColumnTypeRegistry::with_builtins();
        let jdata = serde_json::json!({"name": "shape", "type": "Geometry"});
        let err = Column::from_json(&types, &jdata).unwrap_err();
        assert!(err.is_invalid_column_type());
    }
}
