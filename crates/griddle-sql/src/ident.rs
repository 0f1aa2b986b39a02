use crate::SqlDialect;

/// A quoted SQL identifier.
///
/// Identifiers are always rendered through this type; values never are.
pub(crate) struct Ident<'a>(pub &'a str);

impl Ident<'_> {
    pub(crate) fn write(&self, dialect: SqlDialect, dst: &mut String) {
        match dialect {
            SqlDialect::Mysql => {
                dst.push('`');
                for ch in self.0.chars() {
                    if ch == '`' {
                        dst.push('`');
                    }
                    dst.push(ch);
                }
                dst.push('`');
            }
            SqlDialect::Postgresql | SqlDialect::Sqlite => {
                dst.push('"');
                for ch in self.0.chars() {
                    if ch == '"' {
                        dst.push('"');
                    }
                    dst.push(ch);
                }
                dst.push('"');
            }
        }
    }
}
