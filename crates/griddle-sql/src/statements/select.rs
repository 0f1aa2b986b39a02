use super::{args_mismatch, write_table_ref};
use crate::expr::{resolve_column, write_filter, ResolvedColumn};
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::schema::{ColumnFlag, Schema};
use griddle_core::{Result, Value};

use std::fmt::Write;

const DEFAULT_LOCALE: &str = "en_US";

/// Renders a context-driven SELECT.
///
/// Standard columns project from the entity's table, inherited columns
/// through the base-table join chain, translatable columns through a
/// locale-filtered LEFT JOIN on the i18n side table.
pub struct Select;

impl Statement for Select {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Query { schema, context } = *args else {
            return Err(args_mismatch(StatementId::Select));
        };

        let projection = projected_columns(cx, schema)?;
        let projection: Vec<&ResolvedColumn<'_>> = match context.columns() {
            Some(keys) => {
                let mut picked = vec![];
                for key in keys {
                    if let Some(col) = projection.iter().find(|resolved| {
                        resolved.column.name() == key.as_str() || resolved.field == *key
                    }) {
                        picked.push(col);
                    }
                }
                picked
            }
            None => projection.iter().collect(),
        };

        out.push("SELECT ");
        if context.distinct() {
            out.push("DISTINCT ");
        }
        for (i, resolved) in projection.iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            out.push_qualified(&resolved.table, &resolved.field);
        }

        out.push(" FROM ");
        write_table_ref(out, context.namespace(), schema.dbname());

        // Base-table joins materialize inherited columns.
        let mut prev = schema;
        for ancestor in schema.ancestry(cx.schemas)? {
            out.push(" INNER JOIN ");
            write_table_ref(out, context.namespace(), ancestor.dbname());
            out.push(" ON ");
            out.push_qualified(prev.dbname(), "__base_id");
            out.push(" = ");
            out.push_qualified(ancestor.dbname(), &ancestor_key(cx, ancestor)?);
            prev = ancestor;
        }

        // One locale-filtered join per i18n side table in the projection.
        let locale = context.locale().unwrap_or(DEFAULT_LOCALE);
        let mut joined: Vec<&str> = vec![];
        for resolved in &projection {
            if !resolved.column.is_translatable() || joined.contains(&resolved.table.as_str()) {
                continue;
            }
            joined.push(&resolved.table);

            let owner = resolved.table.trim_end_matches("_i18n");
            let owner_model = owner_schema(cx, schema, owner)?;
            let owner_id = owner_model.id_column(cx.schemas)?;

            out.push(" LEFT JOIN ");
            out.push_ident(&resolved.table);
            out.push(" ON (");
            out.push_qualified(&resolved.table, &format!("{owner}_id"));
            out.push(" = ");
            out.push_qualified(owner, &owner_id.field(cx.syntax));
            out.push(" AND ");
            out.push_qualified(&resolved.table, "locale");
            out.push(" = ");
            out.param(Value::String(locale.to_string()));
            out.push(")");
        }

        if let Some(filter) = context.where_clause() {
            if !filter.is_all() {
                out.push(" WHERE ");
                write_filter(cx, schema, filter, out)?;
            }
        }

        if let Some(order) = context.order() {
            out.push(" ORDER BY ");
            for (i, (column, direction)) in order.iter().enumerate() {
                if i > 0 {
                    out.push(", ");
                }
                let resolved = resolve_column(cx, schema, column)?;
                out.push_qualified(&resolved.table, &resolved.field);
                out.push(" ");
                out.push(direction.as_sql());
            }
        }

        let mut suffix = String::new();
        if let Some(limit) = context.limit() {
            write!(&mut suffix, " LIMIT {limit}").unwrap();
        }
        if let Some(start) = context.start() {
            if start > 0 {
                write!(&mut suffix, " OFFSET {start}").unwrap();
            }
        }
        out.push(&suffix);

        Ok(())
    }
}

/// Every selectable column of the entity (own and inherited), resolved to
/// its physical table and field.
fn projected_columns<'a>(
    cx: &RenderContext<'a>,
    schema: &'a Schema,
) -> Result<Vec<ResolvedColumn<'a>>> {
    let mut out = vec![];
    for column in schema.columns_recursive(cx.schemas)? {
        if column.is_virtual() {
            continue;
        }
        out.push(resolve_column(cx, schema, column.name())?);
    }
    Ok(out)
}

/// The identity column a child joins against: the ancestor's own primary
/// key, or its `__base_id` when the ancestor inherits one itself.
fn ancestor_key(cx: &RenderContext<'_>, ancestor: &Schema) -> Result<String> {
    match ancestor
        .columns()
        .find(|column| column.flag(ColumnFlag::Primary))
    {
        Some(id) => Ok(id.field(cx.syntax)),
        None => Ok("__base_id".to_string()),
    }
}

fn owner_schema<'a>(
    cx: &RenderContext<'a>,
    schema: &'a Schema,
    dbname: &str,
) -> Result<&'a Schema> {
    if schema.dbname() == dbname {
        return Ok(schema);
    }
    for ancestor in schema.ancestry(cx.schemas)? {
        if ancestor.dbname() == dbname {
            return Ok(ancestor);
        }
    }
    Ok(schema)
}
