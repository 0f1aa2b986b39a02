/// A value failed a column's validation rule.
#[derive(Debug)]
pub struct ColumnValidationError {
    pub(super) column: String,
    pub(super) message: String,
}

impl core::fmt::Display for ColumnValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "validation failed for `{}`: {}", self.column, self.message)
    }
}
