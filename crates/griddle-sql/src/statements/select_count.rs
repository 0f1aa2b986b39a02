use super::args_mismatch;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::Result;

/// Wraps the inner SELECT in `SELECT COUNT(*) FROM (...) AS records`.
///
/// The inner statement reuses the caller's projection when one is set,
/// falling back to the id column alone.
pub struct SelectCount;

impl Statement for SelectCount {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Query { schema, context } = *args else {
            return Err(args_mismatch(StatementId::SelectCount));
        };

        let inner_context = if context.columns().is_some() {
            context.clone()
        } else {
            let id_column = schema.id_column(cx.schemas)?;
            context.clone().with_columns([id_column.name()])
        };

        let inner = cx.render_detached(
            StatementId::Select,
            &StatementArgs::Query {
                schema,
                context: &inner_context,
            },
        )?;

        out.push("SELECT COUNT(*) AS count FROM (");
        out.push(&inner.sql);
        out.push(") AS records");
        out.extend_params(inner.params);

        Ok(())
    }
}
