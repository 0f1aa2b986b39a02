use crate::{RenderContext, SqlWriter, Statement, StatementArgs};

use griddle_core::Result;

/// The DDL fragment a column flag contributes on this dialect.
pub struct FlagFragment(pub &'static str);

impl Statement for FlagFragment {
    fn render(
        &self,
        _cx: &RenderContext<'_>,
        _args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        out.push(self.0);
        Ok(())
    }
}
