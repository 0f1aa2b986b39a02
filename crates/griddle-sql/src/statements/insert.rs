use super::{args_mismatch, write_table_ref};
use crate::{RenderContext, SqlDialect, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::schema::ColumnFlag;
use griddle_core::{Result, Value};

/// Renders INSERTs for a set of records.
///
/// Standard columns go to the primary table; each locale present on a
/// record adds one INSERT against the i18n side table.
pub struct Insert;

impl Statement for Insert {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Records {
            schema,
            records,
            context,
        } = *args
        else {
            return Err(args_mismatch(StatementId::Insert));
        };

        let id_column = schema.id_column(cx.schemas)?;
        let i18n_table = format!("{}_i18n", schema.dbname());
        let i18n_key = format!("{}_id", schema.dbname());

        for record in records {
            let mut fields: Vec<(String, Value)> = vec![];
            for column in schema.columns() {
                if column.is_virtual() || column.is_translatable() {
                    continue;
                }
                let Some(value) = record.get(column.name()) else {
                    continue;
                };
                if column.flag(ColumnFlag::AutoIncrement) && value.is_null_like() {
                    continue;
                }
                fields.push((column.field(cx.syntax), column.db_store(value.clone())));
            }

            if !fields.is_empty() {
                out.push("INSERT INTO ");
                write_table_ref(out, context.namespace(), schema.dbname());
                out.push(" (");
                for (i, (field, _)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_ident(field);
                }
                out.push(") VALUES (");
                for (i, (_, value)) in fields.into_iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.param(value);
                }
                out.push(")");
                if cx.dialect() == SqlDialect::Postgresql {
                    out.push(" RETURNING ");
                    out.push_ident(&id_column.field(cx.syntax));
                }
                out.end_statement();
            }

            for (locale, values) in record.translations() {
                let mut fields: Vec<(String, Value)> = vec![];
                for column in schema.columns() {
                    if !column.is_translatable() {
                        continue;
                    }
                    if let Some(value) = values.get(column.name()) {
                        fields.push((column.field(cx.syntax), column.db_store(value.clone())));
                    }
                }
                if fields.is_empty() {
                    continue;
                }

                out.push("INSERT INTO ");
                write_table_ref(out, context.namespace(), &i18n_table);
                out.push(" (");
                out.push_ident("locale");
                out.push(", ");
                out.push_ident(&i18n_key);
                for (field, _) in &fields {
                    out.push(", ");
                    out.push_ident(field);
                }
                out.push(") VALUES (");
                out.param(Value::String(locale.clone()));
                out.push(", ");
                out.param(record.id().cloned().unwrap_or(Value::Null));
                for (_, value) in fields {
                    out.push(", ");
                    out.param(value);
                }
                out.push(")");
                out.end_statement();
            }
        }

        Ok(())
    }
}
