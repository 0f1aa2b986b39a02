mod error;
pub use error::Error;

pub mod context;
pub use context::{Context, ContextStack};

pub mod database;
pub use database::DatabaseConfig;

pub mod driver;
pub use driver::{Backend, BackendRegistry, NativeConnection};

pub mod filter;
pub use filter::Filter;

pub mod record;
pub use record::{Collection, Record};

pub mod schema;
pub use schema::Schema;

pub mod syntax;
pub use syntax::{SnakeSyntax, Syntax};

pub mod value;
pub use value::Value;

/// A Result type alias that uses griddle's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
