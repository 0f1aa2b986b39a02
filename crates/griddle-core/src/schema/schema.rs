use super::{Column, ColumnFlag, ColumnTypeRegistry, Index, Pipe, SchemaRegistry, View};
use crate::{Context, Error, Result, Syntax};

use indexmap::IndexMap;
use std::collections::HashMap;

/// What kind of model a schema maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    #[default]
    Table,
    View,
}

/// Meta information about an entity as it maps to the database.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    dbname: String,
    kind: ModelKind,
    inherits: Option<String>,
    abstract_: bool,
    archived: bool,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    pipes: Vec<Pipe>,
    views: IndexMap<String, View>,
    contexts: HashMap<String, Context>,
}

impl Schema {
    pub fn new(name: impl Into<String>, syntax: &dyn Syntax) -> Self {
        let name = name.into();
        let dbname = syntax.table(&name);
        Self {
            name,
            dbname,
            ..Self::default()
        }
    }

    pub fn with_dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }

    pub fn with_kind(mut self, kind: ModelKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_inherits(mut self, parent: impl Into<String>) -> Self {
        self.inherits = Some(parent.into());
        self
    }

    pub fn with_abstract(mut self, state: bool) -> Self {
        self.abstract_ = state;
        self
    }

    pub fn with_archived(mut self, state: bool) -> Self {
        self.archived = state;
        self
    }

    /// Adds a column, enforcing name uniqueness and the single-primary rule.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.columns.contains_key(column.name()) {
            return Err(Error::configuration(format!(
                "duplicate column `{}` on `{}`",
                column.name(),
                self.name
            )));
        }
        if column.flag(ColumnFlag::Primary) {
            if self.inherits.is_some() {
                return Err(Error::configuration(format!(
                    "`{}` inherits its primary key and cannot redefine one",
                    self.name
                )));
            }
            if self
                .columns
                .values()
                .any(|existing| existing.flag(ColumnFlag::Primary))
            {
                return Err(Error::configuration(format!(
                    "`{}` already has a primary column",
                    self.name
                )));
            }
        }
        self.columns.insert(column.name().to_string(), column);
        Ok(())
    }

    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.insert(index.name().to_string(), index);
    }

    pub fn add_pipe(&mut self, pipe: Pipe) {
        self.pipes.push(pipe);
    }

    pub fn add_view(&mut self, view: View) {
        self.views.insert(view.name().to_string(), view);
    }

    /// Registers a per-purpose context preset under a name.
    pub fn add_context(&mut self, name: impl Into<String>, context: Context) {
        self.contexts.insert(name.into(), context);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn is_view(&self) -> bool {
        self.kind == ModelKind::View
    }

    pub fn inherits(&self) -> Option<&str> {
        self.inherits.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// The schema's own columns, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Looks a column up by logical name or physical field name.
    pub fn find_column(&self, key: &str, syntax: &dyn Syntax) -> Option<&Column> {
        self.columns
            .get(key)
            .or_else(|| self.columns.values().find(|col| col.field(syntax) == key))
    }

    /// Own columns plus every ancestor's, rejecting duplicates across the
    /// ancestry.
    pub fn columns_recursive<'a>(
        &'a self,
        schemas: &'a SchemaRegistry,
    ) -> Result<Vec<&'a Column>> {
        let mut out: Vec<&Column> = self.columns.values().collect();
        for ancestor in self.ancestry(schemas)? {
            for column in ancestor.columns() {
                if out.iter().any(|existing| existing.name() == column.name()) {
                    return Err(Error::configuration(format!(
                        "duplicate column `{}` between `{}` and `{}`",
                        column.name(),
                        self.name,
                        ancestor.name()
                    )));
                }
                out.push(column);
            }
        }
        Ok(out)
    }

    /// The inheritance chain, nearest ancestor first.
    pub fn ancestry<'a>(&self, schemas: &'a SchemaRegistry) -> Result<Vec<&'a Schema>> {
        let mut out = vec![];
        let mut parent = self.inherits.clone();
        while let Some(name) = parent {
            let schema = schemas.get(&name)?;
            parent = schema.inherits().map(str::to_string);
            out.push(schema);
        }
        Ok(out)
    }

    /// The column carrying the Primary flag, recursing into the ancestry
    /// when inheritance supplies it.
    pub fn id_column<'a>(&'a self, schemas: &'a SchemaRegistry) -> Result<&'a Column> {
        if let Some(column) = self
            .columns
            .values()
            .find(|column| column.flag(ColumnFlag::Primary))
        {
            return Ok(column);
        }
        for ancestor in self.ancestry(schemas)? {
            if let Some(column) = ancestor
                .columns()
                .find(|column| column.flag(ColumnFlag::Primary))
            {
                return Ok(column);
            }
        }
        Err(Error::configuration(format!(
            "`{}` has no primary column",
            self.name
        )))
    }

    /// Whether any local column is translatable.
    pub fn has_translations(&self) -> bool {
        self.columns.values().any(Column::is_translatable)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn pipe(&self, name: &str) -> Option<&Pipe> {
        self.pipes.iter().find(|pipe| pipe.name() == name)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// The context preset registered under `name`, if any.
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Loads a schema from a JSON definition document.
    pub fn from_json(
        types: &ColumnTypeRegistry,
        syntax: &dyn Syntax,
        jdata: &serde_json::Value,
    ) -> Result<Self> {
        let name = jdata
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::configuration("schema definition is missing `name`"))?;

        let mut schema = Self::new(name, syntax);

        if let Some(dbname) = jdata.get("dbname").and_then(|v| v.as_str()) {
            schema.dbname = dbname.to_string();
        }
        if let Some(parent) = jdata.get("inherits").and_then(|v| v.as_str()) {
            if !parent.is_empty() {
                schema.inherits = Some(parent.to_string());
            }
        }
        schema.abstract_ = jdata
            .get("abstract")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        schema.archived = jdata
            .get("archived")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if let Some(columns) = jdata.get("columns").and_then(|v| v.as_array()) {
            for jcolumn in columns {
                schema.add_column(Column::from_json(types, jcolumn)?)?;
            }
        }
        if let Some(indexes) = jdata.get("indexes").and_then(|v| v.as_array()) {
            for jindex in indexes {
                let name = jindex
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::configuration("index definition is missing `name`"))?;
                let columns: Vec<String> = jindex
                    .get("columns")
                    .and_then(|v| v.as_array())
                    .map(|cols| {
                        cols.iter()
                            .filter_map(|c| c.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                let mut index = Index::new(name, columns);
                if jindex.get("unique").and_then(|v| v.as_bool()).unwrap_or(false) {
                    index = index.unique();
                }
                schema.add_index(index);
            }
        }
        if let Some(pipes) = jdata.get("pipes").and_then(|v| v.as_array()) {
            for jpipe in pipes {
                let get = |key: &str| -> Result<String> {
                    jpipe
                        .get(key)
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            Error::configuration(format!("pipe definition is missing `{key}`"))
                        })
                };
                schema.add_pipe(Pipe::new(
                    get("name")?,
                    get("through")?,
                    get("source")?,
                    get("target")?,
                ));
            }
        }
        if let Some(views) = jdata.get("views").and_then(|v| v.as_array()) {
            for jview in views {
                let name = jview
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let dbname = jview
                    .get("dbname")
                    .and_then(|v| v.as_str())
                    .unwrap_or(name);
                let body = jview.get("body").and_then(|v| v.as_str()).unwrap_or_default();
                schema.add_view(View::new(name, dbname, body));
            }
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::syntax::SnakeSyntax;

    fn registry_with(schemas: Vec<Schema>) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for schema in schemas {
            registry.register(schema);
        }
        registry
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut schema = Schema::new("User", &SnakeSyntax);
        schema
            .add_column(Column::new("name", ColumnType::Text))
            .unwrap();
        let err = schema
            .add_column(Column::new("name", ColumnType::Text))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn second_primary_is_rejected() {
        let mut schema = Schema::new("User", &SnakeSyntax);
        schema.add_column(Column::id()).unwrap();
        let err = schema
            .add_column(Column::new("other", ColumnType::Id).with_flag(ColumnFlag::Primary))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn inheriting_schema_cannot_redefine_primary() {
        let mut child = Schema::new("Employee", &SnakeSyntax).with_inherits("User");
        let err = child.add_column(Column::id()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn id_column_recurses_into_ancestry() {
        let parent = Schema::new("User", &SnakeSyntax)
            .with_column(Column::id())
            .unwrap();
        let child = Schema::new("Employee", &SnakeSyntax)
            .with_inherits("User")
            .with_column(Column::new("title", ColumnType::Text))
            .unwrap();

        let registry = registry_with(vec![parent, child]);
        let child = registry.get("Employee").unwrap();
        assert_eq!(child.id_column(&registry).unwrap().name(), "id");
    }

    #[test]
    fn dangling_parent_is_model_not_found() {
        let child = Schema::new("Employee", &SnakeSyntax).with_inherits("Ghost");
        let registry = registry_with(vec![child]);
        let child = registry.get("Employee").unwrap();
        let err = child.columns_recursive(&registry).unwrap_err();
        assert!(err.is_model_not_found());
    }

    #[test]
    fn from_json_loads_the_document_shape() {
        let types = ColumnTypeRegistry::with_builtins();
        let jdata = serde_json::json!({
            "name": "User",
            "columns": [
                {"name": "id", "type": "Id", "flags": ["Primary", "AutoIncrement", "Required"]},
                {"name": "name", "type": "Text", "flags": ["Required"]},
            ],
            "indexes": [
                {"name": "by_name", "columns": ["name"], "unique": true},
            ],
            "pipes": [
                {"name": "groups", "through": "GroupUser", "source": "user", "target": "group"},
            ],
        });

        let schema = Schema::from_json(&types, &SnakeSyntax, &jdata).unwrap();
        assert_eq!(schema.name(), "User");
        assert_eq!(schema.dbname(), "users");
        assert_eq!(schema.columns().count(), 2);
        assert!(schema.index("by_name").unwrap().is_unique());
        assert_eq!(schema.pipe("groups").unwrap().through(), "GroupUser");
    }
}
