use super::{args_mismatch, write_table_ref};
use crate::expr::write_filter;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::Result;

/// Renders a context-driven DELETE against the entity's table.
pub struct Delete;

impl Statement for Delete {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Query { schema, context } = *args else {
            return Err(args_mismatch(StatementId::Delete));
        };

        out.push("DELETE FROM ");
        write_table_ref(out, context.namespace(), schema.dbname());

        if let Some(filter) = context.where_clause() {
            if !filter.is_all() {
                out.push(" WHERE ");
                write_filter(cx, schema, filter, out)?;
            }
        }

        Ok(())
    }
}
