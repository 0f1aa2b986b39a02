use heck::{ToSnakeCase, ToTitleCase};

/// A naming-convention policy.
///
/// Resolves logical schema/column names to their physical database
/// counterparts when no explicit override is given.
pub trait Syntax: Send + Sync {
    /// Physical column name for a logical column name. Reference columns
    /// get an `_id` suffix.
    fn field(&self, name: &str, reference: bool) -> String;

    /// Physical table name for an entity name.
    fn table(&self, name: &str) -> String;

    /// Human-readable label for a logical name.
    fn display(&self, name: &str) -> String;
}

/// The default policy: snake_case fields, pluralized snake_case tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeSyntax;

impl Syntax for SnakeSyntax {
    fn field(&self, name: &str, reference: bool) -> String {
        let mut base = name.to_snake_case();
        if reference {
            base.push_str("_id");
        }
        base
    }

    fn table(&self, name: &str) -> String {
        pluralizer::pluralize(&name.to_snake_case(), 2, false)
    }

    fn display(&self, name: &str) -> String {
        name.to_title_case()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_naming() {
        let syntax = SnakeSyntax;
        assert_eq!(syntax.field("firstName", false), "first_name");
        assert_eq!(syntax.field("createdBy", true), "created_by_id");
    }

    #[test]
    fn table_naming() {
        let syntax = SnakeSyntax;
        assert_eq!(syntax.table("User"), "users");
        assert_eq!(syntax.table("UserGroup"), "user_groups");
    }
}
