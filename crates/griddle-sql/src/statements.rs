mod add_column;
pub use add_column::AddColumn;

mod alter;
pub use alter::Alter;

mod create;
pub use create::Create;

mod create_index;
pub use create_index::CreateIndex;

mod create_namespace;
pub use create_namespace::CreateNamespace;

mod delete;
pub use delete::Delete;

mod enable_internals;
pub use enable_internals::{
    MysqlEnableInternals, PostgresqlEnableInternals, SqliteEnableInternals,
};

mod flags;
pub use flags::FlagFragment;

mod insert;
pub use insert::Insert;

mod select;
pub use select::Select;

mod select_count;
pub use select_count::SelectCount;

mod update;
pub use update::{Update, UpsertStyle};

use crate::{RenderContext, SqlDialect, SqlWriter, StatementId, StatementRegistry};

use griddle_core::schema::ColumnFlag;
use griddle_core::Error;

/// Registers every built-in dialect module.
///
/// Shared generators are registered for all dialects; the genuinely
/// dialect-specific pieces (auto-increment spelling, upsert clauses,
/// namespaces, internals toggles) are registered per dialect. SQLite has
/// no namespace support and deliberately omits `CREATE NAMESPACE`.
pub fn register_all(registry: &mut StatementRegistry) {
    for dialect in SqlDialect::ALL {
        registry.register(dialect, StatementId::Create, Create);
        registry.register(dialect, StatementId::Alter, Alter);
        registry.register(dialect, StatementId::AddColumn, AddColumn);
        registry.register(dialect, StatementId::Select, Select);
        registry.register(dialect, StatementId::SelectCount, SelectCount);
        registry.register(dialect, StatementId::Insert, Insert);
        registry.register(dialect, StatementId::Delete, Delete);

        registry.register(
            dialect,
            StatementId::Flag(ColumnFlag::Required),
            FlagFragment("NOT NULL"),
        );
        registry.register(
            dialect,
            StatementId::Flag(ColumnFlag::Unique),
            FlagFragment("UNIQUE"),
        );
    }

    registry.register(
        SqlDialect::Mysql,
        StatementId::Flag(ColumnFlag::AutoIncrement),
        FlagFragment("AUTO_INCREMENT"),
    );

    registry.register(
        SqlDialect::Postgresql,
        StatementId::Update,
        Update::new(UpsertStyle::OnConflict),
    );
    registry.register(
        SqlDialect::Sqlite,
        StatementId::Update,
        Update::new(UpsertStyle::OnConflict),
    );
    registry.register(
        SqlDialect::Mysql,
        StatementId::Update,
        Update::new(UpsertStyle::OnDuplicateKey),
    );

    // MySQL has no `IF NOT EXISTS` guard for indexes.
    registry.register(
        SqlDialect::Postgresql,
        StatementId::CreateIndex,
        CreateIndex::guarded(),
    );
    registry.register(
        SqlDialect::Sqlite,
        StatementId::CreateIndex,
        CreateIndex::guarded(),
    );
    registry.register(SqlDialect::Mysql, StatementId::CreateIndex, CreateIndex::plain());

    registry.register(
        SqlDialect::Postgresql,
        StatementId::CreateNamespace,
        CreateNamespace,
    );
    registry.register(SqlDialect::Mysql, StatementId::CreateNamespace, CreateNamespace);

    registry.register(
        SqlDialect::Postgresql,
        StatementId::EnableInternals,
        PostgresqlEnableInternals,
    );
    registry.register(
        SqlDialect::Mysql,
        StatementId::EnableInternals,
        MysqlEnableInternals,
    );
    registry.register(
        SqlDialect::Sqlite,
        StatementId::EnableInternals,
        SqliteEnableInternals,
    );
}

/// A generator was invoked with the wrong argument shape.
pub(crate) fn args_mismatch(id: StatementId) -> Error {
    Error::configuration(format!("invalid arguments for `{id}`"))
}

/// Writes a table reference, qualified by a namespace when one is set.
pub(crate) fn write_table_ref(out: &mut SqlWriter, namespace: Option<&str>, table: &str) {
    match namespace {
        Some(ns) if !ns.is_empty() => out.push_qualified(ns, table),
        _ => out.push_ident(table),
    }
}

/// Renders a bare column definition (name, storage type, flag fragments)
/// by composing the registered `ADD COLUMN` statement and stripping its
/// verb, the way composite DDL builders consume it.
pub(crate) fn write_column_def(
    cx: &RenderContext<'_>,
    column: &griddle_core::schema::Column,
    out: &mut SqlWriter,
) -> griddle_core::Result<()> {
    let fragment = cx.render_detached(
        StatementId::AddColumn,
        &crate::StatementArgs::Column { column },
    )?;
    out.push(
        fragment
            .sql
            .strip_prefix("ADD COLUMN ")
            .unwrap_or(&fragment.sql),
    );
    out.extend_params(fragment.params);
    Ok(())
}
