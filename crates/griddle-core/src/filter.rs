use crate::Value;

/// A backend-agnostic predicate tree.
///
/// Filters combine with [`Filter::and`] / [`Filter::or`], which flatten
/// nested combinations of the same kind. `All` is the identity and drops out
/// of any combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Matches every record.
    #[default]
    All,

    /// A single column comparison.
    Cmp {
        column: String,
        op: CompareOp,
        value: Value,
    },

    /// Every branch must match.
    And(Vec<Filter>),

    /// At least one branch must match.
    Or(Vec<Filter>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Like,
    StartsWith,
    IsNull,
    NotNull,
}

impl Filter {
    pub fn cmp(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Cmp {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, CompareOp::Ne, value)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut branches), Self::And(others)) => {
                branches.extend(others);
                Self::And(branches)
            }
            (Self::And(mut branches), other) => {
                branches.push(other);
                Self::And(branches)
            }
            (this, Self::And(mut branches)) => {
                branches.insert(0, this);
                Self::And(branches)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::Or(mut branches), Self::Or(others)) => {
                branches.extend(others);
                Self::Or(branches)
            }
            (Self::Or(mut branches), other) => {
                branches.push(other);
                Self::Or(branches)
            }
            (this, other) => Self::Or(vec![this, other]),
        }
    }
}
