use griddle_core::schema::{Column, Index, Schema};
use griddle_core::{Context, Record};

/// Typed arguments handed to a statement generator.
#[derive(Clone, Copy)]
pub enum StatementArgs<'a> {
    /// No arguments; used by fragment statements.
    None,

    /// DDL for an entity.
    Create {
        schema: &'a Schema,
        include_references: bool,
    },

    /// Column deltas against an existing entity.
    Alter {
        schema: &'a Schema,
        add: &'a [&'a Column],
        remove: &'a [&'a Column],
    },

    /// A single column definition.
    Column { column: &'a Column },

    /// A named index over an entity.
    Index {
        schema: &'a Schema,
        index: &'a Index,
        check_first: bool,
    },

    /// A namespace (schema) name.
    Namespace { name: &'a str },

    /// Toggling backend internals, optionally scoped to one entity.
    Internals {
        schema: Option<&'a Schema>,
        enabled: bool,
    },

    /// A read or delete driven by a context.
    Query {
        schema: &'a Schema,
        context: &'a Context,
    },

    /// A write over a set of records.
    Records {
        schema: &'a Schema,
        records: &'a [Record],
        context: &'a Context,
    },
}
