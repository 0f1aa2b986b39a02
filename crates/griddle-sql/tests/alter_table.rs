use griddle_core::schema::{
    Column, ColumnFlag, ColumnType, ColumnTypeRegistry, ModelKind, SchemaRegistry,
};
use griddle_core::syntax::SnakeSyntax;
use griddle_core::Schema;
use griddle_sql::{RenderContext, SqlDialect, StatementArgs, StatementId, StatementRegistry};

use pretty_assertions::assert_eq;

fn page_registry() -> SchemaRegistry {
    let mut schema = Schema::new("Page", &SnakeSyntax);
    schema.add_column(Column::id()).unwrap();
    schema
        .add_column(Column::new("slug", ColumnType::Text))
        .unwrap();

    let mut schemas = SchemaRegistry::new();
    schemas.register(schema);
    schemas
}

#[test]
fn alter_adds_standard_and_translatable_columns() {
    let schemas = page_registry();
    let statements = StatementRegistry::standard();
    let types = ColumnTypeRegistry::with_builtins();
    let syntax = SnakeSyntax;

    let summary = Column::new("summary", ColumnType::Text).with_flag(ColumnFlag::Required);
    let title = Column::new("title", ColumnType::Text).with_flag(ColumnFlag::Translatable);
    let add = [&summary, &title];

    let cx = RenderContext::new(
        &statements,
        SqlDialect::Postgresql,
        &schemas,
        &types,
        &syntax,
    );
    let sql = cx
        .render(
            StatementId::Alter,
            &StatementArgs::Alter {
                schema: schemas.get("Page").unwrap(),
                add: &add,
                remove: &[],
            },
        )
        .unwrap();

    assert_eq!(sql.len(), 3);
    assert_eq!(
        sql[0].sql,
        "ALTER TABLE \"pages\"\n    ADD COLUMN \"summary\" TEXT NOT NULL"
    );
    // The side table is brought into existence before it is altered.
    assert_eq!(
        sql[1].sql,
        "CREATE TABLE IF NOT EXISTS \"pages_i18n\" (\
         \"locale\" VARCHAR(5), \
         \"pages_id\" BIGINT REFERENCES \"pages\" (\"id\"), \
         PRIMARY KEY (\"locale\", \"pages_id\"))"
    );
    assert_eq!(
        sql[2].sql,
        "ALTER TABLE \"pages_i18n\" ADD COLUMN \"title\" TEXT"
    );
}

#[test]
fn sqlite_alters_one_column_per_statement() {
    let schemas = page_registry();
    let statements = StatementRegistry::standard();
    let types = ColumnTypeRegistry::with_builtins();
    let syntax = SnakeSyntax;

    let a = Column::new("summary", ColumnType::Text);
    let b = Column::new("subtitle", ColumnType::Text);
    let add = [&a, &b];

    let cx = RenderContext::new(&statements, SqlDialect::Sqlite, &schemas, &types, &syntax);
    let sql = cx
        .render(
            StatementId::Alter,
            &StatementArgs::Alter {
                schema: schemas.get("Page").unwrap(),
                add: &add,
                remove: &[],
            },
        )
        .unwrap();

    assert_eq!(sql.len(), 2);
    assert_eq!(sql[0].sql, "ALTER TABLE \"pages\" ADD COLUMN \"summary\" TEXT");
    assert_eq!(sql[1].sql, "ALTER TABLE \"pages\" ADD COLUMN \"subtitle\" TEXT");
}

#[test]
fn alter_drops_removed_columns() {
    let schemas = page_registry();
    let statements = StatementRegistry::standard();
    let types = ColumnTypeRegistry::with_builtins();
    let syntax = SnakeSyntax;

    let stale = Column::new("stale", ColumnType::Text).with_field("stale");
    let remove = [&stale];

    let cx = RenderContext::new(
        &statements,
        SqlDialect::Postgresql,
        &schemas,
        &types,
        &syntax,
    );
    let sql = cx
        .render(
            StatementId::Alter,
            &StatementArgs::Alter {
                schema: schemas.get("Page").unwrap(),
                add: &[],
                remove: &remove,
            },
        )
        .unwrap();

    assert_eq!(sql.len(), 1);
    assert_eq!(sql[0].sql, "ALTER TABLE \"pages\" DROP COLUMN \"stale\"");
}

#[test]
fn altering_a_view_model_fails() {
    let mut schemas = SchemaRegistry::new();
    schemas.register(Schema::new("Summary", &SnakeSyntax).with_kind(ModelKind::View));

    let statements = StatementRegistry::standard();
    let types = ColumnTypeRegistry::with_builtins();
    let syntax = SnakeSyntax;

    let cx = RenderContext::new(
        &statements,
        SqlDialect::Postgresql,
        &schemas,
        &types,
        &syntax,
    );
    let err = cx
        .render(
            StatementId::Alter,
            &StatementArgs::Alter {
                schema: schemas.get("Summary").unwrap(),
                add: &[],
                remove: &[],
            },
        )
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("view"), "got: {err}");
}
