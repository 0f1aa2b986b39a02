use griddle_core::filter::CompareOp;
use griddle_core::schema::{Column, ColumnFlag, ColumnType, ColumnTypeRegistry, SchemaRegistry};
use griddle_core::syntax::SnakeSyntax;
use griddle_core::{Context, Filter, Schema, Value};
use griddle_sql::{RenderContext, SqlDialect, StatementArgs, StatementId, StatementRegistry};

use pretty_assertions::assert_eq;

struct Env {
    schemas: SchemaRegistry,
    statements: StatementRegistry,
    types: ColumnTypeRegistry,
}

impl Env {
    fn new(schemas: Vec<Schema>) -> Self {
        let mut registry = SchemaRegistry::new();
        for schema in schemas {
            registry.register(schema);
        }
        Self {
            schemas: registry,
            statements: StatementRegistry::standard(),
            types: ColumnTypeRegistry::with_builtins(),
        }
    }

    fn render(&self, dialect: SqlDialect, id: StatementId, entity: &str, context: &Context) -> Vec<griddle_core::driver::SqlStatement> {
        let syntax = SnakeSyntax;
        let cx = RenderContext::new(&self.statements, dialect, &self.schemas, &self.types, &syntax);
        cx.render(
            id,
            &StatementArgs::Query {
                schema: self.schemas.get(entity).unwrap(),
                context,
            },
        )
        .unwrap()
    }
}

fn user_schema() -> Schema {
    let mut schema = Schema::new("User", &SnakeSyntax);
    schema.add_column(Column::id()).unwrap();
    schema
        .add_column(Column::new("name", ColumnType::Text).with_flag(ColumnFlag::Required))
        .unwrap();
    schema
}

fn page_schema() -> Schema {
    let mut schema = Schema::new("Page", &SnakeSyntax);
    schema.add_column(Column::id()).unwrap();
    schema
        .add_column(Column::new("slug", ColumnType::Text))
        .unwrap();
    schema
        .add_column(Column::new("title", ColumnType::Text).with_flag(ColumnFlag::Translatable))
        .unwrap();
    schema
}

#[test]
fn select_renders_filter_order_and_paging() {
    let env = Env::new(vec![user_schema()]);
    let context = Context::new()
        .with_where(Filter::eq("name", "bob").and(Filter::cmp("id", CompareOp::Gt, 10i64)))
        .with_order("+name,-id")
        .with_page(3)
        .with_page_size(25);

    let sql = env.render(SqlDialect::Postgresql, StatementId::Select, "User", &context);
    assert_eq!(sql.len(), 1);
    assert_eq!(
        sql[0].sql,
        "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\" \
         WHERE (\"users\".\"name\" = $1 AND \"users\".\"id\" > $2) \
         ORDER BY \"users\".\"name\" ASC, \"users\".\"id\" DESC \
         LIMIT 25 OFFSET 50"
    );
    assert_eq!(
        sql[0].params,
        vec![Value::String("bob".into()), Value::I64(10)]
    );
}

#[test]
fn translatable_columns_join_the_i18n_table() {
    let env = Env::new(vec![page_schema()]);
    let context = Context::new().with_locale("fr_FR");

    let sql = env.render(SqlDialect::Postgresql, StatementId::Select, "Page", &context);
    assert_eq!(
        sql[0].sql,
        "SELECT \"pages\".\"id\", \"pages\".\"slug\", \"pages_i18n\".\"title\" \
         FROM \"pages\" \
         LEFT JOIN \"pages_i18n\" ON (\"pages_i18n\".\"pages_id\" = \"pages\".\"id\" \
         AND \"pages_i18n\".\"locale\" = $1)"
    );
    assert_eq!(sql[0].params, vec![Value::String("fr_FR".into())]);
}

#[test]
fn inherited_entities_join_their_base_table() {
    let mut child = Schema::new("Employee", &SnakeSyntax).with_inherits("User");
    child
        .add_column(Column::new("title", ColumnType::Text))
        .unwrap();
    let env = Env::new(vec![user_schema(), child]);

    let sql = env.render(
        SqlDialect::Postgresql,
        StatementId::Select,
        "Employee",
        &Context::new(),
    );
    assert_eq!(
        sql[0].sql,
        "SELECT \"employees\".\"title\", \"users\".\"id\", \"users\".\"name\" \
         FROM \"employees\" \
         INNER JOIN \"users\" ON \"employees\".\"__base_id\" = \"users\".\"id\""
    );
}

#[test]
fn select_count_wraps_the_inner_select() {
    let env = Env::new(vec![user_schema()]);
    let context = Context::new().with_where(Filter::eq("name", "bob"));

    let sql = env.render(
        SqlDialect::Postgresql,
        StatementId::SelectCount,
        "User",
        &context,
    );
    assert_eq!(
        sql[0].sql,
        "SELECT COUNT(*) AS count FROM (\
         SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"name\" = $1\
         ) AS records"
    );
    assert_eq!(sql[0].params, vec![Value::String("bob".into())]);
}

#[test]
fn projection_narrows_to_requested_columns() {
    let env = Env::new(vec![user_schema()]);
    let context = Context::new().with_columns(["name"]).with_distinct(true);

    let sql = env.render(SqlDialect::Postgresql, StatementId::Select, "User", &context);
    assert_eq!(
        sql[0].sql,
        "SELECT DISTINCT \"users\".\"name\" FROM \"users\""
    );
}

#[test]
fn in_filter_binds_every_item() {
    let env = Env::new(vec![user_schema()]);
    let context = Context::new().with_where(Filter::cmp(
        "id",
        CompareOp::In,
        Value::List(vec![Value::I64(1), Value::I64(2), Value::I64(3)]),
    ));

    let sql = env.render(SqlDialect::Sqlite, StatementId::Select, "User", &context);
    assert_eq!(
        sql[0].sql,
        "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\" \
         WHERE \"users\".\"id\" IN (?1, ?2, ?3)"
    );
}

#[test]
fn namespace_qualifies_the_table() {
    let env = Env::new(vec![user_schema()]);
    let context = Context::new().with_namespace("archive");

    let sql = env.render(SqlDialect::Postgresql, StatementId::Delete, "User", &context);
    assert_eq!(sql[0].sql, "DELETE FROM \"archive\".\"users\"");
}
