use super::args_mismatch;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::Result;

/// Toggles trigger enforcement, table-wide or session-wide.
pub struct PostgresqlEnableInternals;

impl Statement for PostgresqlEnableInternals {
    fn render(
        &self,
        _cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Internals { schema, enabled } = *args else {
            return Err(args_mismatch(StatementId::EnableInternals));
        };

        match schema {
            Some(schema) => {
                out.push("ALTER TABLE ");
                out.push_ident(schema.dbname());
                out.push(if enabled {
                    " ENABLE TRIGGER ALL"
                } else {
                    " DISABLE TRIGGER ALL"
                });
            }
            None => {
                out.push(if enabled {
                    "SET session_replication_role = DEFAULT"
                } else {
                    "SET session_replication_role = replica"
                });
            }
        }
        Ok(())
    }
}

/// Toggles key maintenance / foreign key checks.
pub struct MysqlEnableInternals;

impl Statement for MysqlEnableInternals {
    fn render(
        &self,
        _cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Internals { schema, enabled } = *args else {
            return Err(args_mismatch(StatementId::EnableInternals));
        };

        match schema {
            Some(schema) => {
                out.push("ALTER TABLE ");
                out.push_ident(schema.dbname());
                out.push(if enabled { " ENABLE KEYS" } else { " DISABLE KEYS" });
            }
            None => {
                out.push(if enabled {
                    "SET FOREIGN_KEY_CHECKS = 1"
                } else {
                    "SET FOREIGN_KEY_CHECKS = 0"
                });
            }
        }
        Ok(())
    }
}

/// Toggles foreign key enforcement; SQLite only has the global pragma.
pub struct SqliteEnableInternals;

impl Statement for SqliteEnableInternals {
    fn render(
        &self,
        _cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Internals { enabled, .. } = *args else {
            return Err(args_mismatch(StatementId::EnableInternals));
        };

        out.push(if enabled {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        });
        Ok(())
    }
}
