/// A pre-built joined projection attached to a schema.
///
/// Views are read-only: they can be created and selected from, never
/// altered or written through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    name: String,
    dbname: String,
    body: String,
}

impl View {
    pub fn new(name: impl Into<String>, dbname: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dbname: dbname.into(),
            body: body.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    /// The raw SELECT body the view is defined as.
    pub fn body(&self) -> &str {
        &self.body
    }
}
