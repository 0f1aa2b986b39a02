use super::Schema;
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// Resolves entity names to their schemas.
///
/// Populated once at startup from the declarative definitions and shared
/// read-only; inheritance and reference traversal resolve through it.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: Schema) {
        self.schemas
            .insert(schema.name().to_string(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Result<&Schema> {
        self.schemas
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| Error::model_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values().map(Arc::as_ref)
    }
}
