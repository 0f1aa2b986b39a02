use super::{args_mismatch, write_column_def};
use crate::{RenderContext, SqlDialect, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::schema::{Column, ColumnFlag, Schema};
use griddle_core::{Error, Result};

/// Renders the DDL for an entity.
///
/// Own columns are partitioned into standard and translatable; translatable
/// columns live in a `<table>_i18n` side table keyed by
/// `("locale", "<table>_id")`. Inherited entities add a hidden `__base_id`
/// column referencing the parent's primary key instead of redefining one.
/// Attached views render after the table.
pub struct Create;

impl Statement for Create {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Create {
            schema,
            include_references,
        } = *args
        else {
            return Err(args_mismatch(StatementId::Create));
        };

        if schema.is_view() {
            let view = schema.view(schema.name()).ok_or_else(|| {
                Error::configuration(format!(
                    "view model `{}` has no view body",
                    schema.name()
                ))
            })?;
            write_view(cx, view.dbname(), view.body(), out);
            return Ok(());
        }

        let mut standard = vec![];
        let mut i18n = vec![];
        for column in schema.columns() {
            if column.is_virtual() {
                continue;
            }
            if !include_references && column.is_reference() {
                continue;
            }
            if column.is_translatable() {
                i18n.push(column);
            } else {
                standard.push(column);
            }
        }

        out.push("CREATE TABLE IF NOT EXISTS ");
        out.push_ident(schema.dbname());
        out.push(" (");

        let mut first = true;
        let mut inline_pk = false;
        for column in &standard {
            if !first {
                out.push(", ");
            }
            first = false;

            // SQLite requires the auto-increment spelling inline on the
            // primary key column.
            if cx.dialect() == SqlDialect::Sqlite
                && column.flag(ColumnFlag::Primary)
                && column.flag(ColumnFlag::AutoIncrement)
            {
                out.push_ident(&column.field(cx.syntax));
                out.push(" INTEGER PRIMARY KEY AUTOINCREMENT");
                inline_pk = true;
                continue;
            }

            write_column_def(cx, column, out)?;
        }
        if let Some(parent_name) = schema.inherits() {
            let parent = cx.schemas.get(parent_name)?;
            let parent_id = parent.id_column(cx.schemas)?;
            if !first {
                out.push(", ");
            }
            out.push_ident("__base_id");
            out.push(" ");
            out.push(&cx.types.reference_db_type(parent_id.type_name(), cx.backend_name())?);
            out.push(" REFERENCES ");
            out.push_ident(parent.dbname());
            out.push(" (");
            out.push_ident(&parent_id.field(cx.syntax));
            out.push(")");
        } else if !inline_pk {
            let id_column = schema.id_column(cx.schemas)?;
            out.push(", PRIMARY KEY (");
            out.push_ident(&id_column.field(cx.syntax));
            out.push(")");
        }

        out.push(")");
        out.end_statement();

        if !i18n.is_empty() {
            write_i18n_table(cx, schema, &i18n, out)?;
            out.end_statement();
        }

        for view in schema.views() {
            write_view(cx, view.dbname(), view.body(), out);
        }

        Ok(())
    }
}

/// Renders the i18n side table for an entity:
/// `("locale" VARCHAR(5), "<table>_id" <id type> REFERENCES "<table>"
/// ("<id field>"), <columns>, PRIMARY KEY ("locale", "<table>_id"))`,
/// created conditionally to support incremental migration.
pub(crate) fn write_i18n_table(
    cx: &RenderContext<'_>,
    schema: &Schema,
    columns: &[&Column],
    out: &mut SqlWriter,
) -> Result<()> {
    let id_column = schema.id_column(cx.schemas)?;
    let table = schema.dbname();
    let i18n_table = format!("{table}_i18n");
    let i18n_key = format!("{table}_id");

    out.push("CREATE TABLE IF NOT EXISTS ");
    out.push_ident(&i18n_table);
    out.push(" (");
    out.push_ident("locale");
    out.push(" VARCHAR(5), ");
    out.push_ident(&i18n_key);
    out.push(" ");
    out.push(&cx.types.reference_db_type(id_column.type_name(), cx.backend_name())?);
    out.push(" REFERENCES ");
    out.push_ident(table);
    out.push(" (");
    out.push_ident(&id_column.field(cx.syntax));
    out.push(")");

    for column in columns {
        out.push(", ");
        write_column_def(cx, column, out)?;
    }

    out.push(", PRIMARY KEY (");
    out.push_ident("locale");
    out.push(", ");
    out.push_ident(&i18n_key);
    out.push("))");

    Ok(())
}

fn write_view(cx: &RenderContext<'_>, dbname: &str, body: &str, out: &mut SqlWriter) {
    match cx.dialect() {
        SqlDialect::Sqlite => {
            out.push("CREATE VIEW IF NOT EXISTS ");
        }
        SqlDialect::Postgresql | SqlDialect::Mysql => {
            out.push("CREATE OR REPLACE VIEW ");
        }
    }
    out.push_ident(dbname);
    out.push(" AS ");
    out.push(body);
    out.end_statement();
}
