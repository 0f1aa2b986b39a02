use crate::{CacheKey, Database, RelationCache};

use griddle_core::filter::CompareOp;
use griddle_core::schema::{Column, ColumnFlag, Pipe};
use griddle_core::{Collection, Context, Error, Filter, Record, Result, Value};

use std::collections::HashMap;
use std::time::Duration;

/// A one-to-many relation seen from the referenced side.
///
/// Binds a reference column of the source entity and exposes, from a
/// target record, the collection of source records pointing at it.
/// Results are cached per `(record id, options hash, database)`; entries
/// expire by timeout or an explicit `reload`.
pub struct ReverseLookup {
    name: String,
    source_entity: String,
    column: String,
    unique: bool,
    cached: bool,
    timeout: Option<Duration>,
    cache: RelationCache,
}

impl ReverseLookup {
    pub fn new(source_entity: impl Into<String>, column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            name: column.clone(),
            source_entity: source_entity.into(),
            column,
            unique: false,
            cached: false,
            timeout: None,
            cache: RelationCache::new(),
        }
    }

    /// Builds the lookup a reference column's reverse descriptor declares.
    pub fn from_column(source_entity: impl Into<String>, column: &Column) -> Result<Self> {
        let reference = column.reference_info().ok_or_else(|| {
            Error::configuration(format!("`{}` is not a reference column", column.name()))
        })?;

        let mut lookup = Self::new(source_entity, column.name());
        lookup.unique = column.flag(ColumnFlag::Unique);
        if let Some(reverse) = &reference.reverse {
            if !reverse.name.is_empty() {
                lookup.name = reverse.name.clone();
            }
            lookup.cached = reverse.cached;
            lookup.timeout = reverse.timeout;
        }
        Ok(lookup)
    }

    pub fn cached(mut self, timeout: Option<Duration>) -> Self {
        self.cached = true;
        self.timeout = timeout;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn cache_key(&self, db: &Database, record_id: &Value, context: &Context) -> CacheKey {
        CacheKey {
            record_id: record_id.clone(),
            options: context.cache_key(),
            database: db.name().to_string(),
        }
    }

    /// The effective lookup context: the target schema's preset for this
    /// relation (when one is registered), the caller's options, and the
    /// reverse predicate ANDed in.
    fn lookup_context(&self, db: &Database, record: &Record, context: &Context) -> Result<Context> {
        let reverse = Filter::eq(self.column.clone(), record.id().cloned().unwrap_or(Value::Null));

        let mut base = context.clone();
        if let Ok(schema) = db.schemas().get(record.entity()) {
            if let Some(preset) = schema.context(&self.name) {
                base = base.based_on(preset);
            }
        }

        let mut out = Context::new().with_where(reverse).based_on(&base);
        if self.unique {
            out = out.with_limit(1);
        }
        Ok(out)
    }

    /// Resolves the relation for one target record, serving from the cache
    /// within the timeout unless `reload` is set.
    pub fn select(
        &self,
        db: &Database,
        record: &Record,
        context: &Context,
        reload: bool,
    ) -> Result<Collection> {
        if !record.is_record() {
            return Ok(Collection::new());
        }
        let record_id = record.id().cloned().unwrap_or(Value::Null);
        let key = self.cache_key(db, &record_id, context);

        if self.cached && !reload {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached);
            }
        }

        let lookup = self.lookup_context(db, record, context)?;
        let collection = db.select(&self.source_entity, &lookup)?;

        if self.cached {
            self.cache.insert(key, collection.clone(), self.timeout);
        }
        Ok(collection)
    }

    /// A unique reverse lookup returns at most one source record.
    pub fn select_first(
        &self,
        db: &Database,
        record: &Record,
        context: &Context,
        reload: bool,
    ) -> Result<Option<Record>> {
        let collection = self.select(db, record, context, reload)?;
        Ok(collection.into_iter().next())
    }

    /// Bulk-populates the cache for a batch of target records with a single
    /// query, partitioning the sources by their reference value. This is
    /// what expansion trees use instead of one query per record.
    pub fn preload(
        &self,
        db: &Database,
        records: &Collection,
        context: &Context,
    ) -> Result<()> {
        let ids = records.ids();
        if ids.is_empty() {
            return Ok(());
        }

        let batch_filter = Filter::cmp(
            self.column.clone(),
            CompareOp::In,
            Value::List(ids.clone()),
        );
        let sources = db.select(
            &self.source_entity,
            &Context::new().with_where(batch_filter).based_on(context),
        )?;

        let mut by_target: HashMap<Value, Collection> = HashMap::new();
        for source in sources {
            let target_id = source
                .get(&self.column)
                .and_then(Value::id)
                .cloned()
                .unwrap_or_else(|| source.get(&self.column).cloned().unwrap_or(Value::Null));
            by_target.entry(target_id).or_default().push(source);
        }

        for id in ids {
            let collection = by_target.remove(&id).unwrap_or_default();
            let key = self.cache_key(db, &id, context);
            self.cache.insert(key, collection, self.timeout);
        }
        Ok(())
    }

    /// Drops every cached result for this relation.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

/// A many-to-many relation from one source record through an association
/// entity.
///
/// Mutations only ever touch association rows; source and target records
/// are never written through a pipe.
pub struct PipeSet {
    pipe: Pipe,
    source_id: Value,
}

impl PipeSet {
    pub fn new(pipe: Pipe, source: &Record) -> Result<Self> {
        if !source.is_record() {
            return Err(Error::configuration(format!(
                "cannot pipe from an unsaved `{}` record",
                source.entity()
            )));
        }
        Ok(Self {
            pipe,
            source_id: source.id().cloned().unwrap_or(Value::Null),
        })
    }

    fn source_filter(&self) -> Filter {
        Filter::eq(self.pipe.source_column().to_string(), self.source_id.clone())
    }

    fn link_filter(&self, target: &Record) -> Filter {
        self.source_filter().and(Filter::eq(
            self.pipe.target_column().to_string(),
            target.id().cloned().unwrap_or(Value::Null),
        ))
    }

    /// Inserts an association row linking source and target. With
    /// `unique_record`, an existing link short-circuits to `None`.
    pub fn add_record(
        &self,
        db: &Database,
        target: &Record,
        unique_record: bool,
    ) -> Result<Option<Record>> {
        if !target.is_record() {
            return Ok(None);
        }

        if unique_record {
            let existing = db.count(
                self.pipe.through(),
                &Context::new().with_where(self.link_filter(target)),
            )?;
            if existing > 0 {
                return Ok(None);
            }
        }

        let mut link = Record::new(self.pipe.through());
        link.set(self.pipe.source_column(), self.source_id.clone());
        link.set(
            self.pipe.target_column(),
            target.id().cloned().unwrap_or(Value::Null),
        );
        let mut links = [link];
        db.insert(self.pipe.through(), &mut links, &Context::new())?;
        let [link] = links;
        Ok(Some(link))
    }

    /// Deletes the association rows matching one target.
    pub fn remove_record(
        &self,
        db: &Database,
        target: &Record,
        extra: Option<Filter>,
    ) -> Result<u64> {
        if !target.is_record() {
            return Ok(0);
        }
        let mut filter = self.link_filter(target);
        if let Some(extra) = extra {
            filter = filter.and(extra);
        }
        db.delete(self.pipe.through(), &Context::new().with_where(filter))
    }

    /// Deletes every association row for the source matching the extra
    /// filter.
    pub fn clear(&self, db: &Database, extra: Option<Filter>) -> Result<u64> {
        let mut filter = self.source_filter();
        if let Some(extra) = extra {
            filter = filter.and(extra);
        }
        db.delete(self.pipe.through(), &Context::new().with_where(filter))
    }

    /// Deletes every link for the source.
    pub fn remove(&self, db: &Database) -> Result<u64> {
        self.clear(db, None)
    }

    /// Whether an association row links source and target.
    pub fn has_record(&self, db: &Database, target: &Record) -> Result<bool> {
        if !target.is_record() {
            return Ok(false);
        }
        let count = db.count(
            self.pipe.through(),
            &Context::new().with_where(self.link_filter(target)),
        )?;
        Ok(count > 0)
    }

    /// The target records reachable through the pipe.
    pub fn records(&self, db: &Database, context: &Context) -> Result<Collection> {
        let links = db.select(
            self.pipe.through(),
            &Context::new().with_where(self.source_filter()),
        )?;

        let target_ids: Vec<Value> = links
            .iter()
            .filter_map(|link| {
                link.get(self.pipe.target_column())
                    .map(|value| value.id().cloned().unwrap_or_else(|| value.clone()))
            })
            .collect();
        if target_ids.is_empty() {
            return Ok(Collection::new());
        }

        let through = db.schemas().get(self.pipe.through())?;
        let target_entity = through
            .column(self.pipe.target_column())
            .and_then(Column::reference_info)
            .map(|reference| reference.entity.clone())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "pipe `{}` target `{}` is not a reference column",
                    self.pipe.name(),
                    self.pipe.target_column()
                ))
            })?;

        let id_name = db
            .schemas()
            .get(&target_entity)?
            .id_column(db.schemas())?
            .name()
            .to_string();

        db.select(
            &target_entity,
            &Context::new()
                .with_where(Filter::cmp(id_name, CompareOp::In, Value::List(target_ids)))
                .based_on(context),
        )
    }
}
