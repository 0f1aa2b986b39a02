use crate::{Ident, Placeholder, SqlDialect};

use griddle_core::driver::SqlStatement;
use griddle_core::Value;

/// Accumulates rendered SQL text and bound parameters.
///
/// A writer produces a batch of discrete statements; placeholder numbering
/// restarts with each statement so every entry can be prepared and bound
/// independently.
pub struct SqlWriter {
    dialect: SqlDialect,
    statements: Vec<SqlStatement>,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            statements: vec![],
            sql: String::new(),
            params: vec![],
        }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Writes a quoted identifier.
    pub fn push_ident(&mut self, name: &str) {
        Ident(name).write(self.dialect, &mut self.sql);
    }

    /// Writes a qualified identifier, e.g. `"table"."column"`.
    pub fn push_qualified(&mut self, qualifier: &str, name: &str) {
        Ident(qualifier).write(self.dialect, &mut self.sql);
        self.sql.push('.');
        Ident(name).write(self.dialect, &mut self.sql);
    }

    /// Binds a value and writes its placeholder.
    pub fn param(&mut self, value: Value) {
        self.params.push(value);
        Placeholder(self.params.len()).write(self.dialect, &mut self.sql);
    }

    /// Appends already-bound parameters without writing placeholders. Used
    /// when splicing a detached fragment whose text carries them.
    pub fn extend_params(&mut self, params: Vec<Value>) {
        self.params.extend(params);
    }

    /// Whether the current statement has any text yet.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Finalizes the current statement and starts a new one.
    pub fn end_statement(&mut self) {
        if self.sql.is_empty() {
            return;
        }
        self.statements.push(SqlStatement {
            sql: std::mem::take(&mut self.sql),
            params: std::mem::take(&mut self.params),
        });
    }

    pub fn finish(mut self) -> Vec<SqlStatement> {
        self.end_statement();
        self.statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_styles() {
        for (dialect, expected) in [
            (SqlDialect::Postgresql, "SELECT $1, $2"),
            (SqlDialect::Mysql, "SELECT ?, ?"),
            (SqlDialect::Sqlite, "SELECT ?1, ?2"),
        ] {
            let mut out = SqlWriter::new(dialect);
            out.push("SELECT ");
            out.param(Value::I64(1));
            out.push(", ");
            out.param(Value::I64(2));

            let stmts = out.finish();
            assert_eq!(stmts.len(), 1);
            assert_eq!(stmts[0].sql, expected);
            assert_eq!(stmts[0].params, vec![Value::I64(1), Value::I64(2)]);
        }
    }

    #[test]
    fn numbering_restarts_per_statement() {
        let mut out = SqlWriter::new(SqlDialect::Postgresql);
        out.push("A ");
        out.param(Value::I64(1));
        out.end_statement();
        out.push("B ");
        out.param(Value::I64(2));

        let stmts = out.finish();
        assert_eq!(stmts[0].sql, "A $1");
        assert_eq!(stmts[1].sql, "B $1");
    }

    #[test]
    fn identifier_quoting() {
        let mut pg = SqlWriter::new(SqlDialect::Postgresql);
        pg.push_qualified("users", "name");
        assert_eq!(pg.finish()[0].sql, "\"users\".\"name\"");

        let mut my = SqlWriter::new(SqlDialect::Mysql);
        my.push_qualified("users", "name");
        assert_eq!(my.finish()[0].sql, "`users`.`name`");
    }
}
