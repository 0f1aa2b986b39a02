use crate::SqlDialect;

use std::fmt::Write;

/// A bound-parameter placeholder, 1-indexed within its statement.
pub(crate) struct Placeholder(pub usize);

impl Placeholder {
    pub(crate) fn write(&self, dialect: SqlDialect, dst: &mut String) {
        match dialect {
            SqlDialect::Mysql => dst.push('?'),
            SqlDialect::Postgresql => write!(dst, "${}", self.0).unwrap(),
            SqlDialect::Sqlite => write!(dst, "?{}", self.0).unwrap(),
        }
    }
}
