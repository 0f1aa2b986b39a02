use super::create::write_i18n_table;
use super::args_mismatch;
use crate::{RenderContext, SqlDialect, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::{Error, Result};

/// Applies column deltas to an existing entity.
///
/// Added columns are partitioned into standard and translatable; the i18n
/// side table is created on demand before translatable columns are added
/// to it. Altering a view model is a configuration error.
pub struct Alter;

impl Statement for Alter {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Alter {
            schema,
            add,
            remove,
        } = *args
        else {
            return Err(args_mismatch(StatementId::Alter));
        };

        if schema.is_view() {
            return Err(Error::configuration(format!(
                "cannot alter view model `{}`",
                schema.name()
            )));
        }

        let mut add_standard = vec![];
        let mut add_i18n = vec![];
        for column in add.iter() {
            if column.is_virtual() {
                continue;
            }
            if column.is_translatable() {
                add_i18n.push(*column);
            } else {
                add_standard.push(*column);
            }
        }

        if !add_standard.is_empty() {
            match cx.dialect() {
                // SQLite accepts a single ADD COLUMN per ALTER statement.
                SqlDialect::Sqlite => {
                    for column in &add_standard {
                        out.push("ALTER TABLE ");
                        out.push_ident(schema.dbname());
                        out.push(" ");
                        write_add_fragment(cx, column, out)?;
                        out.end_statement();
                    }
                }
                _ => {
                    out.push("ALTER TABLE ");
                    out.push_ident(schema.dbname());
                    for (i, column) in add_standard.iter().enumerate() {
                        out.push(if i == 0 { "\n    " } else { ",\n    " });
                        write_add_fragment(cx, column, out)?;
                    }
                    out.end_statement();
                }
            }
        }

        for column in remove.iter() {
            if column.is_virtual() {
                continue;
            }
            let table = if column.is_translatable() {
                i18n_name(schema.dbname())
            } else {
                schema.dbname().to_string()
            };
            out.push("ALTER TABLE ");
            out.push_ident(&table);
            out.push(" DROP COLUMN ");
            out.push_ident(&column.field(cx.syntax));
            out.end_statement();
        }

        if !add_i18n.is_empty() {
            // Bring the side table into existence before altering it.
            write_i18n_table(cx, schema, &[], out)?;
            out.end_statement();

            let i18n_table = i18n_name(schema.dbname());
            for column in &add_i18n {
                out.push("ALTER TABLE ");
                out.push_ident(&i18n_table);
                out.push(" ");
                write_add_fragment(cx, column, out)?;
                out.end_statement();
            }
        }

        Ok(())
    }
}

fn i18n_name(table: &str) -> String {
    format!("{table}_i18n")
}

/// Writes the `ADD COLUMN ...` fragment by composing the registered
/// primitive.
fn write_add_fragment(
    cx: &RenderContext<'_>,
    column: &griddle_core::schema::Column,
    out: &mut SqlWriter,
) -> Result<()> {
    let fragment = cx.render_detached(
        StatementId::AddColumn,
        &StatementArgs::Column { column },
    )?;
    out.push(&fragment.sql);
    out.extend_params(fragment.params);
    Ok(())
}
