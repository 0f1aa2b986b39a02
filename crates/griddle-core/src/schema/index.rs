use std::time::Duration;

/// A named lookup over an ordered set of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: String,
    columns: Vec<String>,
    unique: bool,
    cached: bool,
    timeout: Option<Duration>,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            cached: false,
            timeout: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn cached(mut self, timeout: Option<Duration>) -> Self {
        self.cached = true;
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical column names, in index order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
