mod value;
use value::SqliteValue;

use griddle_core::driver::{
    ExecuteResult, InterruptHandle, NativeConnection, Row, SchemaInfo, SqlStatement, TableInfo,
};
use griddle_core::{Backend, DatabaseConfig, Error, Result, Value};

use rusqlite::Connection as RusqliteConnection;
use std::path::PathBuf;
use tracing::debug;

/// SQLite backend over `rusqlite`.
///
/// The database name in the configuration is the file path, or
/// `:memory:` for an in-memory database.
#[derive(Debug, Default)]
pub struct Sqlite;

impl Sqlite {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn open(&self, config: &DatabaseConfig) -> Result<Box<dyn NativeConnection>> {
        let connection = if config.name == ":memory:" || config.name.is_empty() {
            RusqliteConnection::open_in_memory()
        } else {
            RusqliteConnection::open(PathBuf::from(&config.name))
        }
        .map_err(|err| Error::connection_failed(err.to_string()))?;

        Ok(Box::new(Connection { connection }))
    }
}

pub struct Connection {
    connection: RusqliteConnection,
}

impl NativeConnection for Connection {
    fn execute(&mut self, batch: &[SqlStatement], returning: bool) -> Result<ExecuteResult> {
        let transactional = batch.len() > 1;
        if transactional {
            self.connection
                .execute_batch("BEGIN")
                .map_err(|err| classify(err, "BEGIN", &[]))?;
        }

        let mut result = ExecuteResult::default();
        for stmt in batch {
            match self.execute_one(stmt, returning, &mut result) {
                Ok(()) => {}
                Err(err) => {
                    if transactional {
                        // Partial failure rolls the whole batch back.
                        let _ = self.connection.execute_batch("ROLLBACK");
                    }
                    return Err(err);
                }
            }
        }

        if transactional {
            self.connection
                .execute_batch("COMMIT")
                .map_err(|err| classify(err, "COMMIT", &[]))?;
        }
        Ok(result)
    }

    fn closed(&self) -> bool {
        // rusqlite handles stay usable until dropped.
        false
    }

    fn interrupt_handle(&self) -> Box<dyn InterruptHandle> {
        Box::new(SqliteInterrupt(self.connection.get_interrupt_handle()))
    }

    fn schema_info(&mut self) -> Result<SchemaInfo> {
        let mut out = SchemaInfo::new();

        let tables: Vec<String> = {
            let mut stmt = self
                .connection
                .prepare(
                    "SELECT name FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )
                .map_err(|err| classify(err, "sqlite_master", &[]))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|err| classify(err, "sqlite_master", &[]))?;
            rows.collect::<rusqlite::Result<_>>()
                .map_err(|err| classify(err, "sqlite_master", &[]))?
        };

        for table in tables {
            let mut info = TableInfo::default();
            self.connection
                .pragma(None, "table_info", &table, |row| {
                    info.fields.push(row.get::<_, String>(1)?);
                    Ok(())
                })
                .map_err(|err| classify(err, "PRAGMA table_info", &[]))?;
            self.connection
                .pragma(None, "index_list", &table, |row| {
                    info.indexes.push(row.get::<_, String>(1)?);
                    Ok(())
                })
                .map_err(|err| classify(err, "PRAGMA index_list", &[]))?;
            out.insert(table, info);
        }

        Ok(out)
    }
}

impl Connection {
    fn execute_one(
        &mut self,
        stmt: &SqlStatement,
        returning: bool,
        result: &mut ExecuteResult,
    ) -> Result<()> {
        debug!(sql = %stmt.sql, "sqlite execute");

        let mut prepared = self
            .connection
            .prepare(&stmt.sql)
            .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;

        let params: Vec<SqliteValue<'_>> = stmt.params.iter().map(SqliteValue).collect();

        if returning && prepared.column_count() > 0 {
            let names: Vec<String> = prepared
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();

            let mut rows = prepared
                .query(rusqlite::params_from_iter(params.iter()))
                .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;

            loop {
                match rows.next() {
                    Ok(Some(row)) => {
                        let mut out = Row::new();
                        for (index, name) in names.iter().enumerate() {
                            let raw = row
                                .get_ref(index)
                                .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;
                            out.insert(name.clone(), value::from_sql(raw));
                        }
                        result.rows.push(out);
                    }
                    Ok(None) => break,
                    Err(err) => return Err(classify(err, &stmt.sql, &stmt.params)),
                }
            }
            result.affected += result.rows.len() as u64;
        } else {
            let count = prepared
                .execute(rusqlite::params_from_iter(params.iter()))
                .map_err(|err| classify(err, &stmt.sql, &stmt.params))?;
            result.affected += count as u64;
        }

        Ok(())
    }
}

struct SqliteInterrupt(rusqlite::InterruptHandle);

impl InterruptHandle for SqliteInterrupt {
    fn interrupt(&self) {
        // Advisory: interrupting an idle connection is a no-op.
        self.0.interrupt();
    }
}

/// Classifies a native sqlite error into the uniform taxonomy. Anything
/// unrecognized degrades to QueryFailed carrying the offending command.
fn classify(err: rusqlite::Error, sql: &str, params: &[Value]) -> Error {
    if let rusqlite::Error::SqliteFailure(native, ref message) = err {
        let message = message.clone().unwrap_or_else(|| native.to_string());
        match native.code {
            rusqlite::ErrorCode::OperationInterrupted => return Error::interruption(),
            rusqlite::ErrorCode::CannotOpen => return Error::connection_failed(message),
            rusqlite::ErrorCode::ConstraintViolation => {
                return match native.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Error::duplicate_entry(message)
                    }
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Error::cannot_delete(message),
                    _ if message.contains("UNIQUE constraint failed") => {
                        Error::duplicate_entry(message)
                    }
                    _ if message.contains("FOREIGN KEY constraint failed") => {
                        Error::cannot_delete(message)
                    }
                    _ => Error::query_failed(sql, params.to_vec(), message),
                };
            }
            _ => {}
        }
    }
    Error::query_failed(sql, params.to_vec(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code,
            },
            Some(message.to_string()),
        )
    }

    #[test]
    fn unique_violation_classifies_as_duplicate() {
        let err = classify(
            constraint(
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                "UNIQUE constraint failed: users.email",
            ),
            "INSERT INTO users ...",
            &[],
        );
        assert!(err.is_duplicate_entry());
        assert!(err.to_string().contains("users.email"));
    }

    #[test]
    fn fk_violation_classifies_as_cannot_delete() {
        let err = classify(
            constraint(
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                "FOREIGN KEY constraint failed",
            ),
            "DELETE FROM users",
            &[],
        );
        assert!(err.is_cannot_delete());
    }

    #[test]
    fn interrupt_classifies_as_interruption() {
        let err = classify(
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: rusqlite::ErrorCode::OperationInterrupted,
                    extended_code: 9,
                },
                None,
            ),
            "SELECT 1",
            &[],
        );
        assert!(err.is_interruption());
    }

    #[test]
    fn unknown_errors_degrade_to_query_failed() {
        let err = classify(
            rusqlite::Error::InvalidQuery,
            "SELECT broken",
            &[Value::I64(1)],
        );
        assert!(err.is_query_failed());
        assert_eq!(err.command(), Some("SELECT broken"));
    }
}
