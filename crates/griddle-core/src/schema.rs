mod column;
pub use column::{Column, IndexBinding, Reference, RemoveAction, ReverseDescriptor};

mod flags;
pub use flags::{ColumnFlag, ColumnFlags};

mod index;
pub use index::Index;

mod pipe;
pub use pipe::Pipe;

mod registry;
pub use registry::SchemaRegistry;

#[allow(clippy::module_inception)]
mod schema;
pub use schema::{ModelKind, Schema};

mod types;
pub use types::{ColumnType, ColumnTypeRegistry};

mod view;
pub use view::View;

/// Sort direction for ordering clauses and column defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
