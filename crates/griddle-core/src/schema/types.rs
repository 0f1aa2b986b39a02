use crate::{Error, Result};

use std::collections::HashMap;

/// The logical type of a column, from the engine's point of view.
///
/// The physical storage type is resolved per backend through the
/// [`ColumnTypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Auto-incrementing integer identity.
    Id,
    Boolean,
    Integer,
    Long,
    Float,
    Text,
    String,
    Date,
    Datetime,
    Json,
    Binary,
    /// Relational reference; stored as the target's identity type.
    Reference,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Text => "Text",
            Self::String => "String",
            Self::Date => "Date",
            Self::Datetime => "Datetime",
            Self::Json => "Json",
            Self::Binary => "Binary",
            Self::Reference => "Reference",
        }
    }
}

/// Per-backend storage types for one registered column type.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub base: ColumnType,
    db_types: HashMap<String, String>,
    default_db_type: Option<String>,
}

impl TypeEntry {
    pub fn new(base: ColumnType) -> Self {
        Self {
            base,
            db_types: HashMap::new(),
            default_db_type: None,
        }
    }

    pub fn db_type(mut self, backend: &str, ty: &str) -> Self {
        self.db_types.insert(backend.to_string(), ty.to_string());
        self
    }

    pub fn default_db_type(mut self, ty: &str) -> Self {
        self.default_db_type = Some(ty.to_string());
        self
    }
}

/// Maps column type names to their per-backend storage types.
///
/// Built once at startup (the built-in set plus any custom registrations)
/// and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct ColumnTypeRegistry {
    entries: HashMap<String, TypeEntry>,
}

impl ColumnTypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The registry with every built-in column type registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            "Id",
            TypeEntry::new(ColumnType::Id)
                .db_type("postgresql", "BIGSERIAL")
                .db_type("mysql", "BIGINT")
                .db_type("sqlite", "INTEGER")
                .default_db_type("BIGINT"),
        );
        registry.register(
            "Boolean",
            TypeEntry::new(ColumnType::Boolean).default_db_type("BOOLEAN"),
        );
        registry.register(
            "Integer",
            TypeEntry::new(ColumnType::Integer).default_db_type("INTEGER"),
        );
        registry.register(
            "Long",
            TypeEntry::new(ColumnType::Long).default_db_type("BIGINT"),
        );
        registry.register(
            "Float",
            TypeEntry::new(ColumnType::Float)
                .db_type("mysql", "DOUBLE")
                .default_db_type("DOUBLE PRECISION"),
        );
        registry.register(
            "Text",
            TypeEntry::new(ColumnType::Text).default_db_type("TEXT"),
        );
        registry.register(
            "String",
            TypeEntry::new(ColumnType::String)
                .db_type("postgresql", "CHARACTER VARYING(255)")
                .default_db_type("VARCHAR(255)"),
        );
        registry.register(
            "Date",
            TypeEntry::new(ColumnType::Date).default_db_type("DATE"),
        );
        registry.register(
            "Datetime",
            TypeEntry::new(ColumnType::Datetime)
                .db_type("mysql", "DATETIME")
                .default_db_type("TIMESTAMP"),
        );
        registry.register(
            "Json",
            TypeEntry::new(ColumnType::Json)
                .db_type("postgresql", "JSONB")
                .db_type("mysql", "JSON")
                .default_db_type("TEXT"),
        );
        registry.register(
            "Binary",
            TypeEntry::new(ColumnType::Binary)
                .db_type("postgresql", "BYTEA")
                .default_db_type("BLOB"),
        );
        registry.register(
            "Reference",
            TypeEntry::new(ColumnType::Reference)
                .db_type("sqlite", "INTEGER")
                .default_db_type("BIGINT"),
        );

        registry
    }

    pub fn register(&mut self, name: impl Into<String>, entry: TypeEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Resolves a registered type by name.
    pub fn resolve(&self, name: &str) -> Result<&TypeEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::invalid_column_type(name))
    }

    /// The physical storage type for `name` on `backend`.
    ///
    /// Falls back to the type's default entry; a type with neither a
    /// backend-specific mapping nor a default is unusable on that backend.
    pub fn db_type(&self, name: &str, backend: &str) -> Result<String> {
        let entry = self.resolve(name)?;
        entry
            .db_types
            .get(backend)
            .or(entry.default_db_type.as_ref())
            .cloned()
            .ok_or_else(|| {
                Error::configuration(format!(
                    "column type `{name}` has no storage type for backend `{backend}`"
                ))
            })
    }

    /// The storage type used when another table references a column of this
    /// type. Identity types lose their auto-increment spelling here.
    pub fn reference_db_type(&self, name: &str, backend: &str) -> Result<String> {
        let entry = self.resolve(name)?;
        if entry.base == ColumnType::Id {
            return Ok(match backend {
                "sqlite" => "INTEGER".to_string(),
                _ => "BIGINT".to_string(),
            });
        }
        self.db_type(name, backend)
    }
}

impl Default for ColumnTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_specific_over_default() {
        let registry = ColumnTypeRegistry::with_builtins();
        assert_eq!(registry.db_type("Id", "postgresql").unwrap(), "BIGSERIAL");
        assert_eq!(registry.db_type("Id", "mysql").unwrap(), "BIGINT");
        assert_eq!(registry.db_type("Text", "sqlite").unwrap(), "TEXT");
    }

    #[test]
    fn unregistered_type_fails() {
        let registry = ColumnTypeRegistry::with_builtins();
        let err = registry.db_type("Geometry", "postgresql").unwrap_err();
        assert!(err.is_invalid_column_type());
    }

    #[test]
    fn missing_mapping_without_default_fails() {
        let mut registry = ColumnTypeRegistry::new();
        registry.register("Custom", TypeEntry::new(ColumnType::Text).db_type("mysql", "TEXT"));

        assert!(registry.db_type("Custom", "mysql").is_ok());
        let err = registry.db_type("Custom", "postgresql").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn id_reference_type_loses_serial() {
        let registry = ColumnTypeRegistry::with_builtins();
        assert_eq!(
            registry.reference_db_type("Id", "postgresql").unwrap(),
            "BIGINT"
        );
        assert_eq!(registry.reference_db_type("Id", "sqlite").unwrap(), "INTEGER");
    }
}
