use griddle_core::schema::{
    Column, ColumnFlag, ColumnType, ColumnTypeRegistry, Index, SchemaRegistry,
};
use griddle_core::syntax::SnakeSyntax;
use griddle_core::Schema;
use griddle_sql::{RenderContext, SqlDialect, StatementArgs, StatementId, StatementRegistry};

use pretty_assertions::assert_eq;

fn user_registry() -> SchemaRegistry {
    let mut schema = Schema::new("User", &SnakeSyntax);
    schema.add_column(Column::id()).unwrap();
    schema
        .add_column(Column::new("email", ColumnType::Text))
        .unwrap();
    schema
        .add_column(Column::new("token", ColumnType::Text).with_flag(ColumnFlag::CaseSensitive))
        .unwrap();

    let mut schemas = SchemaRegistry::new();
    schemas.register(schema);
    schemas
}

fn render(
    dialect: SqlDialect,
    schemas: &SchemaRegistry,
    index: &Index,
    check_first: bool,
) -> String {
    let statements = StatementRegistry::standard();
    let types = ColumnTypeRegistry::with_builtins();
    let syntax = SnakeSyntax;
    let cx = RenderContext::new(&statements, dialect, schemas, &types, &syntax);
    let mut sql = cx
        .render(
            StatementId::CreateIndex,
            &StatementArgs::Index {
                schema: schemas.get("User").unwrap(),
                index,
                check_first,
            },
        )
        .unwrap();
    sql.remove(0).sql
}

#[test]
fn case_insensitive_columns_are_lowered() {
    let schemas = user_registry();
    let index = Index::new("by_email", ["email"]);

    assert_eq!(
        render(SqlDialect::Postgresql, &schemas, &index, false),
        "CREATE INDEX \"by_email\" ON \"users\" (lower(\"email\"))"
    );
}

#[test]
fn case_sensitive_columns_index_directly() {
    let schemas = user_registry();
    let index = Index::new("by_token", ["token"]).unique();

    assert_eq!(
        render(SqlDialect::Postgresql, &schemas, &index, false),
        "CREATE UNIQUE INDEX \"by_token\" ON \"users\" (\"token\")"
    );
}

#[test]
fn existence_guard_uses_if_not_exists() {
    let schemas = user_registry();
    let index = Index::new("by_email", ["email"]);

    assert_eq!(
        render(SqlDialect::Postgresql, &schemas, &index, true),
        "CREATE INDEX IF NOT EXISTS \"by_email\" ON \"users\" (lower(\"email\"))"
    );

    // MySQL has no native guard; the check is skipped.
    assert_eq!(
        render(SqlDialect::Mysql, &schemas, &index, true),
        "CREATE INDEX `by_email` ON `users` (lower(`email`))"
    );
}

#[test]
fn multi_column_index_preserves_order() {
    let schemas = user_registry();
    let index = Index::new("by_email_token", ["email", "token"]);

    assert_eq!(
        render(SqlDialect::Postgresql, &schemas, &index, false),
        "CREATE INDEX \"by_email_token\" ON \"users\" (lower(\"email\"), \"token\")"
    );
}
