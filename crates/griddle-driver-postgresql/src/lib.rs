mod value;

use griddle_core::driver::{
    ExecuteResult, InterruptHandle, NativeConnection, Row, SchemaInfo, SqlStatement, TableInfo,
};
use griddle_core::{Backend, DatabaseConfig, Error, Result, Value};

use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::debug;

/// PostgreSQL backend over the synchronous `postgres` client.
#[derive(Debug, Default)]
pub struct Postgresql;

impl Postgresql {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for Postgresql {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn open(&self, config: &DatabaseConfig) -> Result<Box<dyn NativeConnection>> {
        let mut pg = postgres::Config::new();
        pg.host(config.host.as_deref().unwrap_or("localhost"));
        pg.port(config.port.unwrap_or(5432));
        pg.dbname(&config.name);
        if let Some(username) = &config.username {
            pg.user(username);
        }
        if let Some(password) = &config.password {
            pg.password(password);
        }

        let client = pg
            .connect(NoTls)
            .map_err(|err| Error::connection_failed(err.to_string()))?;
        Ok(Box::new(Connection { client }))
    }
}

pub struct Connection {
    client: Client,
}

impl NativeConnection for Connection {
    fn execute(&mut self, batch: &[SqlStatement], returning: bool) -> Result<ExecuteResult> {
        let mut result = ExecuteResult::default();

        if batch.len() > 1 {
            let mut txn = self
                .client
                .transaction()
                .map_err(|err| classify(err, "BEGIN", &[]))?;
            for stmt in batch {
                // Dropping the transaction on error issues the rollback.
                execute_one(&mut txn, stmt, returning, &mut result)?;
            }
            txn.commit().map_err(|err| classify(err, "COMMIT", &[]))?;
        } else {
            for stmt in batch {
                execute_one(&mut self.client, stmt, returning, &mut result)?;
            }
        }

        Ok(result)
    }

    fn closed(&self) -> bool {
        self.client.is_closed()
    }

    fn interrupt_handle(&self) -> Box<dyn InterruptHandle> {
        Box::new(PostgresInterrupt(self.client.cancel_token()))
    }

    fn schema_info(&mut self) -> Result<SchemaInfo> {
        let mut out = SchemaInfo::new();

        let tables = self
            .client
            .query(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                &[],
            )
            .map_err(|err| classify(err, "information_schema.tables", &[]))?;

        for table_row in tables {
            let table: String = table_row.get(0);
            let mut info = TableInfo::default();

            let columns = self
                .client
                .query(
                    "SELECT column_name FROM information_schema.columns \
                     WHERE table_schema = 'public' AND table_name = $1 \
                     ORDER BY ordinal_position",
                    &[&table],
                )
                .map_err(|err| classify(err, "information_schema.columns", &[]))?;
            for column in columns {
                info.fields.push(column.get(0));
            }

            let indexes = self
                .client
                .query(
                    "SELECT indexname FROM pg_indexes \
                     WHERE schemaname = 'public' AND tablename = $1",
                    &[&table],
                )
                .map_err(|err| classify(err, "pg_indexes", &[]))?;
            for index in indexes {
                info.indexes.push(index.get(0));
            }

            out.insert(table, info);
        }

        Ok(out)
    }
}

/// The subset of client/transaction the executor needs.
trait PgExecutor {
    fn query(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<postgres::Row>, postgres::Error>;

    fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<u64, postgres::Error>;
}

impl PgExecutor for Client {
    fn query(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<postgres::Row>, postgres::Error> {
        Client::query(self, sql, params)
    }

    fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<u64, postgres::Error> {
        Client::execute(self, sql, params)
    }
}

impl PgExecutor for postgres::Transaction<'_> {
    fn query(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<Vec<postgres::Row>, postgres::Error> {
        postgres::Transaction::query(self, sql, params)
    }

    fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> std::result::Result<u64, postgres::Error> {
        postgres::Transaction::execute(self, sql, params)
    }
}

fn execute_one(
    executor: &mut impl PgExecutor,
    stmt: &SqlStatement,
    returning: bool,
    result: &mut ExecuteResult,
) -> Result<()> {
    debug!(sql = %stmt.sql, "postgresql execute");

    let owned: Vec<Box<dyn ToSql + Sync>> = stmt.params.iter().map(value::to_param).collect();
    let params: Vec<&(dyn ToSql + Sync)> = owned.iter().map(Box::as_ref).collect();

    if returning && is_returning_statement(&stmt.sql) {
        let rows = executor
            .query(&stmt.sql, &params)
            .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;
        result.affected += rows.len() as u64;
        for row in rows {
            let mut out = Row::new();
            for (index, column) in row.columns().iter().enumerate() {
                out.insert(column.name().to_string(), value::from_column(&row, index));
            }
            result.rows.push(out);
        }
    } else {
        let count = executor
            .execute(&stmt.sql, &params)
            .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;
        result.affected += count;
    }

    Ok(())
}

fn is_returning_statement(sql: &str) -> bool {
    let upper = sql.trim_start().to_ascii_uppercase();
    upper.starts_with("SELECT") || upper.contains(" RETURNING ")
}

struct PostgresInterrupt(postgres::CancelToken);

impl InterruptHandle for PostgresInterrupt {
    fn interrupt(&self) {
        // Advisory cancellation; a failure to cancel is swallowed.
        let _ = self.0.cancel_query(NoTls);
    }
}

/// Classifies a native postgres error into the uniform taxonomy by its
/// SQLSTATE; anything unrecognized degrades to QueryFailed carrying the
/// offending command.
fn classify(err: postgres::Error, sql: &str, params: &[Value]) -> Error {
    if err.is_closed() {
        return Error::connection_lost();
    }

    if let Some(state) = err.code() {
        let message = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());

        return match state {
            s if *s == SqlState::UNIQUE_VIOLATION => Error::duplicate_entry(message),
            s if *s == SqlState::FOREIGN_KEY_VIOLATION => Error::cannot_delete(message),
            s if *s == SqlState::QUERY_CANCELED => Error::interruption(),
            _ => Error::query_failed(sql, params.to_vec(), message),
        };
    }

    Error::query_failed(sql, params.to_vec(), err.to_string())
}
