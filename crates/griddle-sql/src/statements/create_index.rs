use super::args_mismatch;
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::schema::ColumnFlag;
use griddle_core::{Error, Result};

/// Renders `CREATE [UNIQUE] INDEX` over an entity's columns.
///
/// Case-sensitive columns index directly; case-insensitive columns are
/// wrapped in `lower(...)`. The existence guard uses the dialect's native
/// `IF NOT EXISTS` where the dialect has one.
pub struct CreateIndex {
    guard: bool,
}

impl CreateIndex {
    /// Supports the `IF NOT EXISTS` existence guard.
    pub fn guarded() -> Self {
        Self { guard: true }
    }

    /// The dialect has no index existence guard; `check_first` is ignored.
    pub fn plain() -> Self {
        Self { guard: false }
    }
}

impl Statement for CreateIndex {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Index {
            schema,
            index,
            check_first,
        } = *args
        else {
            return Err(args_mismatch(StatementId::CreateIndex));
        };

        out.push(if index.is_unique() {
            "CREATE UNIQUE INDEX "
        } else {
            "CREATE INDEX "
        });
        if check_first && self.guard {
            out.push("IF NOT EXISTS ");
        }
        out.push_ident(index.name());
        out.push(" ON ");
        out.push_ident(schema.dbname());
        out.push(" (");

        for (i, name) in index.columns().iter().enumerate() {
            if i > 0 {
                out.push(", ");
            }
            let column = schema.find_column(name, cx.syntax).ok_or_else(|| {
                Error::configuration(format!(
                    "index `{}` references unknown column `{name}`",
                    index.name()
                ))
            })?;
            let field = column.field(cx.syntax);
            if column.flag(ColumnFlag::CaseSensitive) {
                out.push_ident(&field);
            } else {
                out.push("lower(");
                out.push_ident(&field);
                out.push(")");
            }
        }
        out.push(")");

        Ok(())
    }
}
