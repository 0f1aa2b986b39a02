use crate::{DatabaseConfig, Error, Result, Value};

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// One renderable SQL statement with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }
}

/// A raw result row keyed by physical column name.
pub type Row = IndexMap<String, Value>;

/// The outcome of executing a batch.
#[derive(Debug, Default)]
pub struct ExecuteResult {
    pub rows: Vec<Row>,
    pub affected: u64,
}

/// Raw per-table introspection data. `_i18n` side tables appear as their
/// own entries here; the shared connection layer folds them into their
/// parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    pub fields: Vec<String>,
    pub indexes: Vec<String>,
}

pub type SchemaInfo = IndexMap<String, TableInfo>;

/// A database backend: everything a new backend must supply is this
/// factory plus the [`NativeConnection`] it opens.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// The backend's registered name, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// Establishes a native connection. Any native connect error surfaces
    /// as [`Error::connection_failed`].
    fn open(&self, config: &DatabaseConfig) -> Result<Box<dyn NativeConnection>>;
}

/// A live native connection.
pub trait NativeConnection: Send {
    /// Executes a batch of statements sequentially, accumulating affected
    /// row counts. A batch of more than one statement is wrapped in an
    /// explicit transaction and rolled back on mid-batch failure. With
    /// `returning`, all result rows are fetched and mapped.
    ///
    /// Native errors are classified into the uniform taxonomy; anything
    /// unrecognized surfaces as a QueryFailed carrying the command.
    fn execute(&mut self, batch: &[SqlStatement], returning: bool) -> Result<ExecuteResult>;

    /// Whether the native handle is no longer usable.
    fn closed(&self) -> bool;

    /// A handle that can cancel an in-flight statement from another thread.
    fn interrupt_handle(&self) -> Box<dyn InterruptHandle>;

    /// Lists tables with their columns and indexes.
    fn schema_info(&mut self) -> Result<SchemaInfo>;
}

/// Best-effort cancellation of an in-flight statement.
///
/// Failures to interrupt are swallowed; an interrupt that arrives after
/// completion is a no-op.
pub trait InterruptHandle: Send {
    fn interrupt(&self);
}

/// Maps backend names to their drivers. Populated at startup and shared
/// read-only.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| Error::backend_not_found(name))
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_backend() {
        let registry = BackendRegistry::new();
        assert!(registry.get("mysql").unwrap_err().is_backend_not_found());
    }
}
