/// The SQL dialect a statement renders for.
///
/// Handles the differences between identifier quoting, parameter
/// placeholders and the dialect-specific statement variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    Postgresql,
    Mysql,
    Sqlite,
}

impl SqlDialect {
    pub const ALL: [SqlDialect; 3] = [
        SqlDialect::Postgresql,
        SqlDialect::Mysql,
        SqlDialect::Sqlite,
    ];

    /// The backend name this dialect renders for.
    pub fn backend_name(self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn from_backend_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dialect| dialect.backend_name() == name)
    }
}
