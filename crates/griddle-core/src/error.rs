mod query_failed;
pub use query_failed::QueryFailedError;

mod validation;
pub use validation::ColumnValidationError;

use std::sync::Arc;

/// An error that can occur in griddle.
///
/// Errors are cheap to clone and share; the payload lives behind an `Arc`.
/// Native driver errors are classified into this taxonomy at the driver
/// boundary and never leak their original types.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorKind>,
}

#[derive(Debug)]
enum ErrorKind {
    /// Ad-hoc error bridged from `anyhow`.
    Anyhow(anyhow::Error),

    /// The native connect call failed.
    ConnectionFailed { message: String },

    /// A disconnection was detected mid-operation.
    ConnectionLost,

    /// The requested backend driver is not available.
    BackendNotFound { name: String },

    /// Execution was cancelled by an interrupt request.
    Interruption,

    /// A unique or primary-key constraint was violated.
    DuplicateEntryFound { message: String },

    /// A reference constraint blocks the delete.
    CannotDelete { message: String },

    /// Unclassified native execution error; carries the command for diagnostics.
    QueryFailed(QueryFailedError),

    /// A value failed a column's validation rule.
    ColumnValidation(ColumnValidationError),

    /// A column type name could not be resolved against the type registry.
    InvalidColumnType { name: String },

    /// A referenced table does not exist.
    TableNotFound { name: String },

    /// A referenced model/schema name could not be resolved.
    ModelNotFound { name: String },

    /// Generic configuration or usage error.
    Configuration { message: String },
}

impl Error {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ErrorKind::ConnectionFailed {
            message: message.into(),
        }
        .into()
    }

    pub fn connection_lost() -> Self {
        ErrorKind::ConnectionLost.into()
    }

    pub fn backend_not_found(name: impl Into<String>) -> Self {
        ErrorKind::BackendNotFound { name: name.into() }.into()
    }

    pub fn interruption() -> Self {
        ErrorKind::Interruption.into()
    }

    pub fn duplicate_entry(message: impl Into<String>) -> Self {
        ErrorKind::DuplicateEntryFound {
            message: message.into(),
        }
        .into()
    }

    pub fn cannot_delete(message: impl Into<String>) -> Self {
        ErrorKind::CannotDelete {
            message: message.into(),
        }
        .into()
    }

    pub fn query_failed(
        command: impl Into<String>,
        params: Vec<crate::Value>,
        message: impl Into<String>,
    ) -> Self {
        ErrorKind::QueryFailed(QueryFailedError {
            command: command.into(),
            params,
            message: message.into(),
        })
        .into()
    }

    pub fn column_validation(column: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorKind::ColumnValidation(ColumnValidationError {
            column: column.into(),
            message: message.into(),
        })
        .into()
    }

    pub fn invalid_column_type(name: impl Into<String>) -> Self {
        ErrorKind::InvalidColumnType { name: name.into() }.into()
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        ErrorKind::TableNotFound { name: name.into() }.into()
    }

    pub fn model_not_found(name: impl Into<String>) -> Self {
        ErrorKind::ModelNotFound { name: name.into() }.into()
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ErrorKind::Configuration {
            message: message.into(),
        }
        .into()
    }

    pub fn is_connection_failed(&self) -> bool {
        matches!(*self.inner, ErrorKind::ConnectionFailed { .. })
    }

    pub fn is_connection_lost(&self) -> bool {
        matches!(*self.inner, ErrorKind::ConnectionLost)
    }

    pub fn is_backend_not_found(&self) -> bool {
        matches!(*self.inner, ErrorKind::BackendNotFound { .. })
    }

    pub fn is_interruption(&self) -> bool {
        matches!(*self.inner, ErrorKind::Interruption)
    }

    pub fn is_duplicate_entry(&self) -> bool {
        matches!(*self.inner, ErrorKind::DuplicateEntryFound { .. })
    }

    pub fn is_cannot_delete(&self) -> bool {
        matches!(*self.inner, ErrorKind::CannotDelete { .. })
    }

    pub fn is_query_failed(&self) -> bool {
        matches!(*self.inner, ErrorKind::QueryFailed(_))
    }

    pub fn is_column_validation(&self) -> bool {
        matches!(*self.inner, ErrorKind::ColumnValidation(_))
    }

    pub fn is_invalid_column_type(&self) -> bool {
        matches!(*self.inner, ErrorKind::InvalidColumnType { .. })
    }

    pub fn is_table_not_found(&self) -> bool {
        matches!(*self.inner, ErrorKind::TableNotFound { .. })
    }

    pub fn is_model_not_found(&self) -> bool {
        matches!(*self.inner, ErrorKind::ModelNotFound { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(*self.inner, ErrorKind::Configuration { .. })
    }

    /// The offending command, when this is a QueryFailed error.
    pub fn command(&self) -> Option<&str> {
        match &*self.inner {
            ErrorKind::QueryFailed(err) => Some(&err.command),
            _ => None,
        }
    }

    /// The column name, when this is a validation error.
    pub fn column(&self) -> Option<&str> {
        match &*self.inner {
            ErrorKind::ColumnValidation(err) => Some(&err.column),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        ErrorKind::Anyhow(err).into()
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &*self.inner {
            ErrorKind::Anyhow(err) => core::fmt::Display::fmt(err, f),
            ErrorKind::ConnectionFailed { message } => {
                write!(f, "failed to connect to the database: {message}")
            }
            ErrorKind::ConnectionLost => f.write_str("connection to the database was lost"),
            ErrorKind::BackendNotFound { name } => {
                write!(f, "backend `{name}` is not available")
            }
            ErrorKind::Interruption => f.write_str("execution was interrupted"),
            ErrorKind::DuplicateEntryFound { message } => {
                write!(f, "duplicate entry: {message}")
            }
            ErrorKind::CannotDelete { message } => write!(f, "cannot delete: {message}"),
            ErrorKind::QueryFailed(err) => core::fmt::Display::fmt(err, f),
            ErrorKind::ColumnValidation(err) => core::fmt::Display::fmt(err, f),
            ErrorKind::InvalidColumnType { name } => {
                write!(f, "`{name}` is not a registered column type")
            }
            ErrorKind::TableNotFound { name } => write!(f, "table `{name}` was not found"),
            ErrorKind::ModelNotFound { name } => write!(f, "model `{name}` was not found"),
            ErrorKind::Configuration { message } => core::fmt::Display::fmt(message, f),
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if f.alternate() {
            f.debug_struct("Error").field("kind", &self.inner).finish()
        } else {
            core::fmt::Display::fmt(self, f)
        }
    }
}
