use crate::Connection;

use griddle_core::driver::{ExecuteResult, InterruptHandle, SchemaInfo, SqlStatement};
use griddle_core::schema::{
    Column, ColumnType, ColumnTypeRegistry, RemoveAction, Schema, SchemaRegistry,
};
use griddle_core::{
    Backend, BackendRegistry, Collection, Context, ContextStack, DatabaseConfig, Error, Filter,
    Record, Result, SnakeSyntax, Syntax, Value,
};
use griddle_core::filter::CompareOp;
use griddle_sql::{RenderContext, SqlDialect, StatementArgs, StatementId, StatementRegistry};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// A logical database: configuration, backend, registries and the engine
/// operations that render statements and execute them.
///
/// Registries are populated at startup and shared read-only; the
/// connection is the only guarded mutable state.
pub struct Database {
    config: DatabaseConfig,
    dialect: SqlDialect,
    schemas: Arc<SchemaRegistry>,
    types: Arc<ColumnTypeRegistry>,
    syntax: Arc<dyn Syntax>,
    statements: Arc<StatementRegistry>,
    contexts: Arc<ContextStack>,
    connection: Mutex<Connection>,
}

impl Database {
    pub fn new(
        config: DatabaseConfig,
        backends: &BackendRegistry,
        schemas: Arc<SchemaRegistry>,
    ) -> Result<Self> {
        let backend: Arc<dyn Backend> = backends.get(&config.backend)?;
        let dialect = SqlDialect::from_backend_name(backend.name()).ok_or_else(|| {
            Error::configuration(format!(
                "backend `{}` has no registered SQL dialect",
                backend.name()
            ))
        })?;
        let connection = Mutex::new(Connection::new(backend, config.clone()));

        Ok(Self {
            config,
            dialect,
            schemas,
            types: Arc::new(ColumnTypeRegistry::with_builtins()),
            syntax: Arc::new(SnakeSyntax),
            statements: Arc::new(StatementRegistry::standard()),
            contexts: Arc::new(ContextStack::new()),
            connection,
        })
    }

    pub fn with_types(mut self, types: Arc<ColumnTypeRegistry>) -> Self {
        self.types = types;
        self
    }

    pub fn with_syntax(mut self, syntax: Arc<dyn Syntax>) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_statements(mut self, statements: Arc<StatementRegistry>) -> Self {
        self.statements = statements;
        self
    }

    /// The logical database name, used in relation cache keys.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn syntax(&self) -> &dyn Syntax {
        self.syntax.as_ref()
    }

    /// The per-thread stack of scoped default contexts for this database.
    pub fn contexts(&self) -> &ContextStack {
        &self.contexts
    }

    fn render(&self, id: StatementId, args: &StatementArgs<'_>) -> Result<Vec<SqlStatement>> {
        let cx = RenderContext::new(
            &self.statements,
            self.dialect,
            &self.schemas,
            &self.types,
            self.syntax.as_ref(),
        );
        cx.render(id, args)
    }

    fn run(
        &self,
        batch: Vec<SqlStatement>,
        returning: bool,
        context: &Context,
    ) -> Result<ExecuteResult> {
        if batch.is_empty() {
            return Ok(ExecuteResult::default());
        }
        if context.dry_run() {
            for stmt in &batch {
                info!(sql = %stmt.sql, params = stmt.params.len(), "dry run");
            }
            return Ok(ExecuteResult::default());
        }
        self.connection.lock().unwrap().execute(&batch, returning)
    }

    /// Creates the entity's table(s) and indexes.
    pub fn create_model(&self, entity: &str, context: &Context) -> Result<()> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;

        let mut batch = self.render(
            StatementId::Create,
            &StatementArgs::Create {
                schema,
                include_references: true,
            },
        )?;
        for index in schema.indexes() {
            batch.extend(self.render(
                StatementId::CreateIndex,
                &StatementArgs::Index {
                    schema,
                    index,
                    check_first: true,
                },
            )?);
        }

        self.run(batch, false, &context)?;
        Ok(())
    }

    /// Applies column deltas: `add` names declared columns missing from the
    /// live table, `remove` physical fields no longer declared.
    pub fn alter_model(
        &self,
        entity: &str,
        add: &[&str],
        remove: &[&str],
        context: &Context,
    ) -> Result<()> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;

        let add_columns: Vec<&Column> = add
            .iter()
            .map(|name| {
                schema.column(name).ok_or_else(|| {
                    Error::configuration(format!("`{entity}` has no column `{name}`"))
                })
            })
            .collect::<Result<_>>()?;

        // Dropped columns no longer have declarations; a bare field-level
        // definition is enough to render the DROP.
        let removed: Vec<Column> = remove
            .iter()
            .map(|field| Column::new(*field, ColumnType::Text).with_field(*field))
            .collect();
        let remove_columns: Vec<&Column> = removed.iter().collect();

        let batch = self.render(
            StatementId::Alter,
            &StatementArgs::Alter {
                schema,
                add: &add_columns,
                remove: &remove_columns,
            },
        )?;
        self.run(batch, false, &context)?;
        Ok(())
    }

    /// Reconciles the declared schema against the live database, adding
    /// missing columns.
    pub fn sync_model(&self, entity: &str, context: &Context) -> Result<()> {
        let schema = self.schemas.get(entity)?;
        let info = self.schema_info()?;
        let live = info.get(schema.dbname());

        let mut add = vec![];
        for column in schema.columns() {
            if column.is_virtual() {
                continue;
            }
            let field = column.field(self.syntax.as_ref());
            let exists = live
                .map(|table| table.fields.contains(&field))
                .unwrap_or(false);
            if !exists {
                add.push(column.name());
            }
        }
        if add.is_empty() {
            return Ok(());
        }
        self.alter_model(entity, &add, &[], context)
    }

    pub fn create_namespace(&self, name: &str, context: &Context) -> Result<()> {
        let context = context.resolved(&self.contexts);
        let batch = self.render(
            StatementId::CreateNamespace,
            &StatementArgs::Namespace { name },
        )?;
        self.run(batch, false, &context)?;
        Ok(())
    }

    pub fn enable_internals(
        &self,
        entity: Option<&str>,
        enabled: bool,
        context: &Context,
    ) -> Result<()> {
        let context = context.resolved(&self.contexts);
        let schema = match entity {
            Some(name) => Some(self.schemas.get(name)?),
            None => None,
        };
        let batch = self.render(
            StatementId::EnableInternals,
            &StatementArgs::Internals { schema, enabled },
        )?;
        self.run(batch, false, &context)?;
        Ok(())
    }

    /// Selects records for an entity.
    pub fn select(&self, entity: &str, context: &Context) -> Result<Collection> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;

        let batch = self.render(
            StatementId::Select,
            &StatementArgs::Query {
                schema,
                context: &context,
            },
        )?;
        let result = self.run(batch, true, &context)?;
        self.map_rows(schema, &context, result.rows)
    }

    pub fn select_first(&self, entity: &str, context: &Context) -> Result<Option<Record>> {
        let context = context.clone().with_limit(1);
        let collection = self.select(entity, &context)?;
        Ok(collection.into_iter().next())
    }

    /// Counts matching records via the wrapped inner select.
    pub fn count(&self, entity: &str, context: &Context) -> Result<u64> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;

        let batch = self.render(
            StatementId::SelectCount,
            &StatementArgs::Query {
                schema,
                context: &context,
            },
        )?;
        let result = self.run(batch, true, &context)?;
        let count = result
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count as u64)
    }

    /// Validates and inserts records; ids handed back by the backend are
    /// assigned onto records that lack one.
    pub fn insert(&self, entity: &str, records: &mut [Record], context: &Context) -> Result<u64> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;
        self.validate(schema, records, false)?;

        let batch = self.render(
            StatementId::Insert,
            &StatementArgs::Records {
                schema,
                records,
                context: &context,
            },
        )?;
        let returning = self.dialect == SqlDialect::Postgresql;
        let result = self.run(batch, returning, &context)?;

        let id_name = schema.id_column(&self.schemas)?.name().to_string();
        let id_field = schema.id_column(&self.schemas)?.field(self.syntax.as_ref());
        let mut returned = result.rows.iter();
        for record in records.iter_mut() {
            if record.get(&id_name).map(Value::is_null_like).unwrap_or(true) {
                if let Some(id) = returned.next().and_then(|row| row.get(&id_field)) {
                    record.set(id_name.clone(), id.clone());
                }
            }
            record.mark_loaded();
        }

        Ok(result.affected)
    }

    /// Validates changed values and writes per-record updates, including
    /// the per-locale i18n upserts.
    pub fn update(&self, entity: &str, records: &mut [Record], context: &Context) -> Result<u64> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;
        self.validate(schema, records, true)?;

        let batch = self.render(
            StatementId::Update,
            &StatementArgs::Records {
                schema,
                records,
                context: &context,
            },
        )?;
        let result = self.run(batch, false, &context)?;

        for record in records.iter_mut() {
            record.mark_loaded();
        }
        Ok(result.affected)
    }

    /// Deletes matching records, enforcing the remove action of every
    /// reference column pointing at this entity: Block fails when
    /// referencing rows exist, Cascade deletes them first.
    pub fn delete(&self, entity: &str, context: &Context) -> Result<u64> {
        let context = context.resolved(&self.contexts);
        let schema = self.schemas.get(entity)?;

        let mut referencing = vec![];
        for other in self.schemas.iter() {
            for column in other.columns() {
                if let Some(reference) = column.reference_info() {
                    if reference.entity == entity && reference.on_remove != RemoveAction::DoNothing
                    {
                        referencing.push((other, column, reference.on_remove));
                    }
                }
            }
        }

        if !referencing.is_empty() {
            let id_name = schema.id_column(&self.schemas)?.name();
            let targets =
                self.select(entity, &context.clone().with_columns([id_name]))?;
            let ids: Vec<Value> = targets
                .iter()
                .filter_map(|record| record.get(id_name).cloned())
                .collect();

            if !ids.is_empty() {
                for (other, column, action) in referencing {
                    let linked = Filter::cmp(
                        column.name(),
                        CompareOp::In,
                        Value::List(ids.clone()),
                    );
                    match action {
                        RemoveAction::Block => {
                            let count = self
                                .count(other.name(), &Context::new().with_where(linked))?;
                            if count > 0 {
                                return Err(Error::cannot_delete(format!(
                                    "{count} `{}` record(s) still reference `{entity}`",
                                    other.name()
                                )));
                            }
                        }
                        RemoveAction::Cascade => {
                            self.delete(other.name(), &Context::new().with_where(linked))?;
                        }
                        RemoveAction::DoNothing => {}
                    }
                }
            }
        }

        let batch = self.render(
            StatementId::Delete,
            &StatementArgs::Query {
                schema,
                context: &context,
            },
        )?;
        let result = self.run(batch, false, &context)?;
        Ok(result.affected)
    }

    /// Introspects the live database; `_i18n` side tables are folded into
    /// their parent entry.
    pub fn schema_info(&self) -> Result<SchemaInfo> {
        self.connection.lock().unwrap().schema_info()
    }

    /// A handle for cancelling the in-flight statement from another
    /// thread. Grab it before starting the long-running call.
    pub fn interrupt_handle(&self) -> Result<Box<dyn InterruptHandle>> {
        let mut conn = self.connection.lock().unwrap();
        conn.open()?;
        conn.interrupt_handle()
    }

    pub fn close(&self) {
        self.connection.lock().unwrap().close();
    }

    /// Validation runs synchronously before any write reaches the backend.
    fn validate(&self, schema: &Schema, records: &[Record], changes_only: bool) -> Result<()> {
        for record in records {
            if changes_only {
                for name in record.changes() {
                    if let Some(column) = schema.column(name) {
                        let value = record.get(name).cloned().unwrap_or(Value::Null);
                        column.validate(&value)?;
                    }
                }
            } else {
                for column in schema.columns() {
                    if column.is_virtual() || column.is_translatable() {
                        continue;
                    }
                    let value = record
                        .get(column.name())
                        .cloned()
                        .or_else(|| column.default())
                        .unwrap_or(Value::Null);
                    column.validate(&value)?;
                }
            }
        }
        Ok(())
    }

    /// Maps raw rows back into records: fields resolve to columns, values
    /// restore through the column conversions, translatable fields land in
    /// the row's locale.
    fn map_rows(
        &self,
        schema: &Schema,
        context: &Context,
        rows: Vec<griddle_core::driver::Row>,
    ) -> Result<Collection> {
        let mut by_field: HashMap<String, &Column> = HashMap::new();
        for column in schema.columns_recursive(&self.schemas)? {
            by_field.insert(column.field(self.syntax.as_ref()), column);
        }
        let locale = context.locale().unwrap_or("en_US").to_string();

        let mut collection = Collection::new();
        for row in rows {
            let mut record = Record::new(schema.name());
            for (field, raw) in row {
                match by_field.get(&field) {
                    Some(column) if column.is_translatable() => {
                        record.set_translation(
                            locale.clone(),
                            column.name(),
                            column.db_restore(raw),
                        );
                    }
                    Some(column) => {
                        record.set(column.name(), column.extract(raw)?);
                    }
                    None => record.set(field, raw),
                }
            }
            record.mark_loaded();
            collection.push(record);
        }
        Ok(collection)
    }
}
