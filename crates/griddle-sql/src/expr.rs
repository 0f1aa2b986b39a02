use crate::{RenderContext, SqlWriter};

use griddle_core::filter::{CompareOp, Filter};
use griddle_core::schema::{Column, Schema};
use griddle_core::{Error, Result, Value};

/// A logical column resolved to the physical table and field it reads
/// from: the entity's own table, an ancestor's table, or the i18n side
/// table for translatable columns.
pub(crate) struct ResolvedColumn<'a> {
    pub table: String,
    pub field: String,
    pub column: &'a Column,
}

pub(crate) fn resolve_column<'a>(
    cx: &RenderContext<'a>,
    schema: &'a Schema,
    key: &str,
) -> Result<ResolvedColumn<'a>> {
    let mut owner = schema;
    let mut column = schema.find_column(key, cx.syntax);

    if column.is_none() {
        for ancestor in schema.ancestry(cx.schemas)? {
            if let Some(found) = ancestor.find_column(key, cx.syntax) {
                owner = ancestor;
                column = Some(found);
                break;
            }
        }
    }

    let column = column.ok_or_else(|| {
        Error::configuration(format!("`{}` has no column `{key}`", schema.name()))
    })?;

    let table = if column.is_translatable() {
        format!("{}_i18n", owner.dbname())
    } else {
        owner.dbname().to_string()
    };

    Ok(ResolvedColumn {
        table,
        field: column.field(cx.syntax),
        column,
    })
}

/// Renders a filter tree as a WHERE predicate. Values always travel
/// through bound parameters.
pub(crate) fn write_filter(
    cx: &RenderContext<'_>,
    schema: &Schema,
    filter: &Filter,
    out: &mut SqlWriter,
) -> Result<()> {
    match filter {
        Filter::All => {
            out.push("1 = 1");
            Ok(())
        }
        Filter::And(branches) => write_branches(cx, schema, branches, " AND ", out),
        Filter::Or(branches) => write_branches(cx, schema, branches, " OR ", out),
        Filter::Cmp { column, op, value } => {
            let resolved = resolve_column(cx, schema, column)?;
            write_comparison(&resolved, *op, value, out)
        }
    }
}

fn write_branches(
    cx: &RenderContext<'_>,
    schema: &Schema,
    branches: &[Filter],
    join: &str,
    out: &mut SqlWriter,
) -> Result<()> {
    out.push("(");
    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            out.push(join);
        }
        write_filter(cx, schema, branch, out)?;
    }
    out.push(")");
    Ok(())
}

fn write_comparison(
    resolved: &ResolvedColumn<'_>,
    op: CompareOp,
    value: &Value,
    out: &mut SqlWriter,
) -> Result<()> {
    let stored = resolved.column.db_store(value.clone());

    match op {
        CompareOp::Eq if stored.is_null() => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(" IS NULL");
        }
        CompareOp::Ne if stored.is_null() => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(" IS NOT NULL");
        }
        CompareOp::Eq
        | CompareOp::Ne
        | CompareOp::Lt
        | CompareOp::Le
        | CompareOp::Gt
        | CompareOp::Ge
        | CompareOp::Like => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(match op {
                CompareOp::Eq => " = ",
                CompareOp::Ne => " <> ",
                CompareOp::Lt => " < ",
                CompareOp::Le => " <= ",
                CompareOp::Gt => " > ",
                CompareOp::Ge => " >= ",
                _ => " LIKE ",
            });
            out.param(stored);
        }
        CompareOp::StartsWith => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(" LIKE ");
            let pattern = match stored {
                Value::String(s) => format!("{s}%"),
                other => return Err(Error::configuration(format!(
                    "startswith expects a string value, got {other:?}"
                ))),
            };
            out.param(Value::String(pattern));
        }
        CompareOp::In | CompareOp::NotIn => {
            let items = match stored {
                Value::List(items) => items,
                single => vec![single],
            };
            if items.is_empty() {
                // An empty IN set can never match; an empty NOT IN always does.
                out.push(if op == CompareOp::In { "1 = 0" } else { "1 = 1" });
                return Ok(());
            }
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(if op == CompareOp::In {
                " IN ("
            } else {
                " NOT IN ("
            });
            for (i, item) in items.into_iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                out.param(item);
            }
            out.push(")");
        }
        CompareOp::IsNull => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(" IS NULL");
        }
        CompareOp::NotNull => {
            out.push_qualified(&resolved.table, &resolved.field);
            out.push(" IS NOT NULL");
        }
    }
    Ok(())
}
