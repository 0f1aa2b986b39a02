use crate::{statements, SqlDialect, SqlWriter, StatementArgs};

use griddle_core::driver::SqlStatement;
use griddle_core::schema::{ColumnFlag, ColumnTypeRegistry, SchemaRegistry};
use griddle_core::{Error, Result, Syntax};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Canonical statement names.
///
/// `Flag(..)` entries hold the dialect fragment a column flag contributes
/// to DDL; a flag with no entry contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementId {
    Create,
    Alter,
    AddColumn,
    CreateNamespace,
    CreateIndex,
    EnableInternals,
    Select,
    SelectCount,
    Update,
    Insert,
    Delete,
    Flag(ColumnFlag),
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("CREATE"),
            Self::Alter => f.write_str("ALTER"),
            Self::AddColumn => f.write_str("ADD COLUMN"),
            Self::CreateNamespace => f.write_str("CREATE NAMESPACE"),
            Self::CreateIndex => f.write_str("CREATE INDEX"),
            Self::EnableInternals => f.write_str("ENABLE INTERNALS"),
            Self::Select => f.write_str("SELECT"),
            Self::SelectCount => f.write_str("SELECT COUNT"),
            Self::Update => f.write_str("UPDATE"),
            Self::Insert => f.write_str("INSERT"),
            Self::Delete => f.write_str("DELETE"),
            Self::Flag(flag) => write!(f, "Flag::{}", flag.name()),
        }
    }
}

/// A named, dialect-scoped SQL generator.
///
/// Statements are stateless and reusable; composites resolve the
/// primitives they build on by name through the registry, never by direct
/// reference, so overriding a primitive re-targets every composite.
pub trait Statement: Send + Sync {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()>;
}

/// Maps `(dialect, statement name)` to its generator.
///
/// Populated once per dialect module at startup and read-only afterwards.
#[derive(Default)]
pub struct StatementRegistry {
    map: HashMap<(SqlDialect, StatementId), Arc<dyn Statement>>,
}

impl StatementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in dialect module registered.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        statements::register_all(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        dialect: SqlDialect,
        id: StatementId,
        statement: impl Statement + 'static,
    ) {
        self.map.insert((dialect, id), Arc::new(statement));
    }

    pub fn get(&self, dialect: SqlDialect, id: StatementId) -> Option<&dyn Statement> {
        self.map.get(&(dialect, id)).map(Arc::as_ref)
    }
}

/// Everything a generator needs to render: the registry for composition,
/// the dialect, and the schema/type/naming environment.
pub struct RenderContext<'a> {
    registry: &'a StatementRegistry,
    dialect: SqlDialect,
    pub schemas: &'a SchemaRegistry,
    pub types: &'a ColumnTypeRegistry,
    pub syntax: &'a dyn Syntax,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        registry: &'a StatementRegistry,
        dialect: SqlDialect,
        schemas: &'a SchemaRegistry,
        types: &'a ColumnTypeRegistry,
        syntax: &'a dyn Syntax,
    ) -> Self {
        Self {
            registry,
            dialect,
            schemas,
            types,
            syntax,
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn backend_name(&self) -> &'static str {
        self.dialect.backend_name()
    }

    /// Resolves a required statement; a missing entry means the feature is
    /// not supported on this backend, which is a configuration failure.
    pub fn statement(&self, id: StatementId) -> Result<&dyn Statement> {
        self.registry.get(self.dialect, id).ok_or_else(|| {
            Error::configuration(format!(
                "`{id}` is not supported on backend `{}`",
                self.backend_name()
            ))
        })
    }

    /// Resolves an optional statement, e.g. a flag fragment.
    pub fn try_statement(&self, id: StatementId) -> Option<&dyn Statement> {
        self.registry.get(self.dialect, id)
    }

    /// Renders a statement into a fresh batch.
    pub fn render(&self, id: StatementId, args: &StatementArgs<'_>) -> Result<Vec<SqlStatement>> {
        let mut out = SqlWriter::new(self.dialect);
        self.statement(id)?.render(self, args, &mut out)?;
        Ok(out.finish())
    }

    /// Renders a statement expected to produce exactly one entry, for
    /// splicing into a composite.
    pub fn render_detached(
        &self,
        id: StatementId,
        args: &StatementArgs<'_>,
    ) -> Result<SqlStatement> {
        let mut stmts = self.render(id, args)?;
        match stmts.len() {
            1 => Ok(stmts.remove(0)),
            n => Err(Error::configuration(format!(
                "`{id}` rendered {n} statements where one was expected"
            ))),
        }
    }
}
