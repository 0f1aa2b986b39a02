use super::args_mismatch;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::Result;

/// Renders `ADD COLUMN <field> <type> <flag fragments>`.
///
/// Each registered flag contributes its dialect fragment through the
/// `Flag::<Name>` registry entries; unmapped flags contribute nothing.
pub struct AddColumn;

impl Statement for AddColumn {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Column { column } = *args else {
            return Err(args_mismatch(StatementId::AddColumn));
        };

        out.push("ADD COLUMN ");
        out.push_ident(&column.field(cx.syntax));
        out.push(" ");
        out.push(&column.db_type(cx.types, cx.backend_name())?);

        for flag in column.flags().iter() {
            if let Some(fragment) = cx.try_statement(StatementId::Flag(flag)) {
                out.push(" ");
                fragment.render(cx, &StatementArgs::None, out)?;
            }
        }

        Ok(())
    }
}
