/// A many-to-many relation mediated by an association entity.
///
/// Rows of `through` carry one reference column pointing at each side;
/// traversing the pipe from a source record joins through the association
/// table to reach target records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipe {
    name: String,
    through: String,
    source_column: String,
    target_column: String,
}

impl Pipe {
    pub fn new(
        name: impl Into<String>,
        through: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            through: through.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The association entity the pipe goes through.
    pub fn through(&self) -> &str {
        &self.through
    }

    /// The association column referencing the source entity.
    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    /// The association column referencing the target entity.
    pub fn target_column(&self) -> &str {
        &self.target_column
    }
}
