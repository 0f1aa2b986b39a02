#![allow(dead_code)]

use griddle::driver::{
    ExecuteResult, InterruptHandle, NativeConnection, Row, SchemaInfo, SqlStatement,
};
use griddle::schema::{Column, ColumnType, RemoveAction, SchemaRegistry};
use griddle::{
    Backend, BackendRegistry, Database, DatabaseConfig, Record, Result, Schema, SnakeSyntax,
    Value,
};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted in-memory backend: records every executed statement and
/// plays back queued results, so tests can assert exactly how many
/// queries reach the execution layer.
#[derive(Default)]
pub struct StubState {
    executed: Mutex<Vec<SqlStatement>>,
    calls: Mutex<usize>,
    responses: Mutex<VecDeque<ExecuteResult>>,
}

impl StubState {
    pub fn queue_rows(&self, rows: Vec<Row>) {
        self.responses.lock().unwrap().push_back(ExecuteResult {
            affected: rows.len() as u64,
            rows,
        });
    }

    pub fn queue_count(&self, count: i64) {
        let mut row = Row::new();
        row.insert("count".to_string(), Value::I64(count));
        self.queue_rows(vec![row]);
    }

    pub fn queue_affected(&self, affected: u64) {
        self.responses.lock().unwrap().push_back(ExecuteResult {
            rows: vec![],
            affected,
        });
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn executed(&self) -> Vec<SqlStatement> {
        self.executed.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct StubBackend {
    state: Arc<StubState>,
}

impl std::fmt::Debug for StubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubState").finish_non_exhaustive()
    }
}

impl StubBackend {
    pub fn state(&self) -> Arc<StubState> {
        self.state.clone()
    }
}

impl Backend for StubBackend {
    fn name(&self) -> &'static str {
        // Renders through the sqlite dialect.
        "sqlite"
    }

    fn open(&self, _config: &DatabaseConfig) -> Result<Box<dyn NativeConnection>> {
        Ok(Box::new(StubConnection {
            state: self.state.clone(),
        }))
    }
}

struct StubConnection {
    state: Arc<StubState>,
}

impl NativeConnection for StubConnection {
    fn execute(&mut self, batch: &[SqlStatement], _returning: bool) -> Result<ExecuteResult> {
        *self.state.calls.lock().unwrap() += 1;
        self.state.executed.lock().unwrap().extend_from_slice(batch);
        Ok(self
            .state
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn closed(&self) -> bool {
        false
    }

    fn interrupt_handle(&self) -> Box<dyn InterruptHandle> {
        struct Noop;
        impl InterruptHandle for Noop {
            fn interrupt(&self) {}
        }
        Box::new(Noop)
    }

    fn schema_info(&mut self) -> Result<SchemaInfo> {
        Ok(SchemaInfo::new())
    }
}

/// User / Ticket / Group / GroupUser fixtures: a reverse relation from
/// Ticket.assignee and a pipe from User to Group through GroupUser.
pub fn fixture_schemas(on_remove: RemoveAction) -> SchemaRegistry {
    let syntax = SnakeSyntax;
    let mut schemas = SchemaRegistry::new();

    let mut user = Schema::new("User", &syntax);
    user.add_column(Column::id()).unwrap();
    user.add_column(Column::new("name", ColumnType::Text)).unwrap();
    schemas.register(user);

    let mut ticket = Schema::new("Ticket", &syntax);
    ticket.add_column(Column::id()).unwrap();
    ticket
        .add_column(Column::new("title", ColumnType::Text))
        .unwrap();
    ticket
        .add_column(Column::reference("assignee", "User").with_remove_action(on_remove))
        .unwrap();
    schemas.register(ticket);

    let mut group = Schema::new("Group", &syntax);
    group.add_column(Column::id()).unwrap();
    group
        .add_column(Column::new("name", ColumnType::Text))
        .unwrap();
    schemas.register(group);

    let mut group_user = Schema::new("GroupUser", &syntax);
    group_user.add_column(Column::id()).unwrap();
    group_user
        .add_column(
            Column::reference("user", "User").with_remove_action(RemoveAction::DoNothing),
        )
        .unwrap();
    group_user
        .add_column(
            Column::reference("group", "Group").with_remove_action(RemoveAction::DoNothing),
        )
        .unwrap();
    schemas.register(group_user);

    schemas
}

pub fn stub_database(on_remove: RemoveAction) -> (Database, Arc<StubState>) {
    stub_database_with(fixture_schemas(on_remove))
}

pub fn stub_database_with(schemas: SchemaRegistry) -> (Database, Arc<StubState>) {
    let backend = Arc::new(StubBackend::default());
    let state = backend.state();

    let mut backends = BackendRegistry::new();
    backends.register(backend);

    let db = Database::new(
        DatabaseConfig::new("sqlite", "stub"),
        &backends,
        Arc::new(schemas),
    )
    .unwrap();
    (db, state)
}

pub fn saved_record(entity: &str, id: i64) -> Record {
    let mut record = Record::new(entity);
    record.set("id", Value::I64(id));
    record.mark_loaded();
    record
}

pub fn ticket_row(id: i64, assignee: i64) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), Value::I64(id));
    row.insert("title".to_string(), Value::String(format!("ticket {id}")));
    row.insert("assignee_id".to_string(), Value::I64(assignee));
    row
}
