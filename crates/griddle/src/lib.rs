mod cache;
pub use cache::{CacheKey, RelationCache};

mod connection;
pub use connection::{Connection, ConnectionState};

mod db;
pub use db::Database;

mod relations;
pub use relations::{PipeSet, ReverseLookup};

pub use griddle_core::{
    driver, filter, schema, Backend, BackendRegistry, Collection, Context, ContextStack,
    DatabaseConfig, Error, Filter, Record, Result, Schema, SnakeSyntax, Syntax, Value,
};
pub use griddle_sql::{RenderContext, SqlDialect, StatementId, StatementRegistry};

/// The built-in backends enabled by this build's features.
pub fn default_backends() -> BackendRegistry {
    #[allow(unused_mut)]
    let mut registry = BackendRegistry::new();
    #[cfg(feature = "sqlite")]
    registry.register(std::sync::Arc::new(griddle_driver_sqlite::Sqlite::new()));
    #[cfg(feature = "postgresql")]
    registry.register(std::sync::Arc::new(
        griddle_driver_postgresql::Postgresql::new(),
    ));
    registry
}
