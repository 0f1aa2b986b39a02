use super::args_mismatch;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::Result;

/// Renders `CREATE SCHEMA IF NOT EXISTS` for dialects with namespaces.
/// The name is always rendered as a quoted identifier.
pub struct CreateNamespace;

impl Statement for CreateNamespace {
    fn render(
        &self,
        _cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Namespace { name } = *args else {
            return Err(args_mismatch(StatementId::CreateNamespace));
        };

        out.push("CREATE SCHEMA IF NOT EXISTS ");
        out.push_ident(name);
        Ok(())
    }
}
