mod stub;

use stub::{saved_record, stub_database, stub_database_with, ticket_row};

use griddle::driver::Row;
use griddle::schema::{Column, ColumnFlag, ColumnType, RemoveAction, SchemaRegistry};
use griddle::{Context, Filter, Record, Schema, SnakeSyntax, Value};

use pretty_assertions::assert_eq;

fn page_schemas() -> SchemaRegistry {
    let mut page = Schema::new("Page", &SnakeSyntax);
    page.add_column(Column::id()).unwrap();
    page.add_column(Column::new("slug", ColumnType::Text).with_flag(ColumnFlag::Required))
        .unwrap();
    page.add_column(Column::new("title", ColumnType::Text).with_flag(ColumnFlag::Translatable))
        .unwrap();

    let mut schemas = SchemaRegistry::new();
    schemas.register(page);
    schemas
}

#[test]
fn select_maps_rows_back_to_records() {
    let (db, state) = stub_database(RemoveAction::Block);

    state.queue_rows(vec![ticket_row(1, 7)]);
    let tickets = db.select("Ticket", &Context::new()).unwrap();

    assert_eq!(tickets.len(), 1);
    let ticket = tickets.first().unwrap();
    assert_eq!(ticket.get("id"), Some(&Value::I64(1)));
    assert_eq!(ticket.get("title"), Some(&Value::String("ticket 1".into())));
    // The raw foreign key value inflates to a reference tagged with its
    // entity.
    assert_eq!(
        ticket.get("assignee"),
        Some(&Value::Reference {
            entity: "User".into(),
            id: Box::new(Value::I64(7)),
        })
    );
    assert!(ticket.is_record());
    assert!(!ticket.has_changes());
}

#[test]
fn translatable_fields_land_in_the_context_locale() {
    let (db, state) = stub_database_with(page_schemas());

    let mut row = Row::new();
    row.insert("id".to_string(), Value::I64(1));
    row.insert("slug".to_string(), Value::String("home".into()));
    row.insert("title".to_string(), Value::String("Accueil".into()));
    state.queue_rows(vec![row]);

    let pages = db
        .select("Page", &Context::new().with_locale("fr_FR"))
        .unwrap();
    let page = pages.first().unwrap();

    assert_eq!(page.get("slug"), Some(&Value::String("home".into())));
    assert_eq!(page.get("title"), None);
    assert_eq!(
        page.translations_for("title").get("fr_FR"),
        Some(&&Value::String("Accueil".into()))
    );
}

#[test]
fn count_reads_the_wrapped_aggregate() {
    let (db, state) = stub_database(RemoveAction::Block);

    state.queue_count(42);
    let count = db.count("Ticket", &Context::new()).unwrap();
    assert_eq!(count, 42);
}

#[test]
fn insert_validates_before_touching_the_backend() {
    let (db, state) = stub_database_with(page_schemas());

    // `slug` is required and missing.
    let mut page = Record::new("Page");
    page.set("title", "Home");

    let err = db
        .insert("Page", &mut [page], &Context::new())
        .unwrap_err();
    assert!(err.is_column_validation());
    assert_eq!(err.column(), Some("slug"));
    assert_eq!(state.calls(), 0);
}

#[test]
fn false_is_a_valid_required_value() {
    let mut schema = Schema::new("Toggle", &SnakeSyntax);
    schema.add_column(Column::id()).unwrap();
    schema
        .add_column(Column::new("enabled", ColumnType::Boolean).with_flag(ColumnFlag::Required))
        .unwrap();
    let mut schemas = SchemaRegistry::new();
    schemas.register(schema);

    let (db, state) = stub_database_with(schemas);
    state.queue_affected(1);

    let mut toggle = Record::new("Toggle");
    toggle.set("enabled", false);
    db.insert("Toggle", &mut [toggle], &Context::new()).unwrap();
    assert_eq!(state.calls(), 1);
}

#[test]
fn blocked_references_stop_the_delete() {
    let (db, state) = stub_database(RemoveAction::Block);

    // ids to delete, then the referencing count.
    let mut id_row = Row::new();
    id_row.insert("id".to_string(), Value::I64(7));
    state.queue_rows(vec![id_row]);
    state.queue_count(2);

    let err = db
        .delete("User", &Context::new().with_where(Filter::eq("id", 7i64)))
        .unwrap_err();
    assert!(err.is_cannot_delete());
    assert!(err.to_string().contains("Ticket"), "got: {err}");

    // The entity's own DELETE never ran.
    let executed = state.executed();
    assert!(executed
        .iter()
        .all(|stmt| !stmt.sql.starts_with("DELETE FROM \"users\"")));
}

#[test]
fn cascade_deletes_referencing_records_first() {
    let (db, state) = stub_database(RemoveAction::Cascade);

    let mut id_row = Row::new();
    id_row.insert("id".to_string(), Value::I64(7));
    state.queue_rows(vec![id_row]);
    state.queue_affected(3); // cascade delete of tickets
    state.queue_affected(1); // delete of the user

    let deleted = db
        .delete("User", &Context::new().with_where(Filter::eq("id", 7i64)))
        .unwrap();
    assert_eq!(deleted, 1);

    let sql: Vec<String> = state
        .executed()
        .iter()
        .map(|stmt| stmt.sql.clone())
        .collect();
    let tickets = sql
        .iter()
        .position(|s| s.starts_with("DELETE FROM \"tickets\""))
        .expect("cascade delete");
    let users = sql
        .iter()
        .position(|s| s.starts_with("DELETE FROM \"users\""))
        .expect("primary delete");
    assert!(tickets < users);
}

#[test]
fn dry_run_renders_without_executing() {
    let (db, state) = stub_database(RemoveAction::Block);

    let mut ticket = Record::new("Ticket");
    ticket.set("title", "noop");
    db.insert("Ticket", &mut [ticket], &Context::new().with_dry_run(true))
        .unwrap();

    assert_eq!(state.calls(), 0);
}

#[test]
fn scoped_default_context_applies_to_operations() {
    let (db, state) = stub_database(RemoveAction::Block);

    let scope = db
        .contexts()
        .push(Context::new().with_where(Filter::eq("title", "urgent")));

    state.queue_rows(vec![]);
    db.select("Ticket", &Context::new()).unwrap();
    drop(scope);

    let executed = state.executed();
    assert!(
        executed[0].sql.contains("\"tickets\".\"title\" = ?1"),
        "got: {}",
        executed[0].sql
    );
    assert_eq!(executed[0].params, vec![Value::String("urgent".into())]);
}

#[test]
fn update_clears_dirty_tracking() {
    let (db, state) = stub_database(RemoveAction::Block);
    state.queue_affected(1);

    let mut ticket = saved_record("Ticket", 1);
    ticket.set("title", "renamed");
    db.update("Ticket", &mut [ticket.clone()], &Context::new())
        .unwrap();

    // The engine's copy is marked clean after the write.
    let executed = state.executed();
    assert!(executed[0].sql.starts_with("UPDATE \"tickets\""));
    assert_eq!(
        executed[0].params,
        vec![Value::String("renamed".into()), Value::I64(1)]
    );
}
