use crate::schema::Direction;
use crate::Filter;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use std::thread::{self, ThreadId};

/// An opaque caller-supplied scope object. Excluded from context equality
/// and hashing.
pub type Scope = Arc<dyn Any + Send + Sync>;

/// What an execution should hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Returning {
    /// Fully mapped records.
    #[default]
    Records,
    /// Raw row data.
    Data,
}

/// Expansion input: a flat list of dotted paths, a comma-joined string, or
/// a nested mapping. All normalize to a flat list of dotted paths.
#[derive(Debug, Clone)]
pub enum Expand {
    Paths(Vec<String>),
    Joined(String),
    Tree(BTreeMap<String, Expand>),
}

impl Expand {
    fn normalize(&self) -> Vec<String> {
        match self {
            Self::Paths(paths) => paths.clone(),
            Self::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::Tree(tree) => {
                let mut out = vec![];
                for (key, child) in tree {
                    out.push(key.clone());
                    for path in child.normalize() {
                        out.push(format!("{key}.{path}"));
                    }
                }
                out
            }
        }
    }
}

impl From<&str> for Expand {
    fn from(joined: &str) -> Self {
        Self::Joined(joined.to_string())
    }
}

impl From<Vec<String>> for Expand {
    fn from(paths: Vec<String>) -> Self {
        Self::Paths(paths)
    }
}

impl From<Vec<&str>> for Expand {
    fn from(paths: Vec<&str>) -> Self {
        Self::Paths(paths.into_iter().map(str::to_string).collect())
    }
}

/// A nested expansion path tree, used to drive recursive eager loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandTree(pub BTreeMap<String, ExpandTree>);

impl ExpandTree {
    fn insert_path(&mut self, path: &str) {
        match path.split_once('.') {
            Some((head, rest)) => {
                self.0.entry(head.to_string()).or_default().insert_path(rest);
            }
            None => {
                self.0.entry(path.to_string()).or_default();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ExpandTree> {
        self.0.get(key)
    }
}

/// Ordering input: normalized `(column, direction)` pairs or a comma-joined
/// string of `+field` / `-field` tokens.
#[derive(Debug, Clone)]
pub enum Order {
    Pairs(Vec<(String, Direction)>),
    Tokens(String),
}

impl Order {
    fn normalize(&self) -> Vec<(String, Direction)> {
        match self {
            Self::Pairs(pairs) => pairs.clone(),
            Self::Tokens(tokens) => tokens
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|token| {
                    let direction = if token.starts_with('-') {
                        Direction::Desc
                    } else {
                        Direction::Asc
                    };
                    (
                        token.trim_start_matches(['+', '-']).to_string(),
                        direction,
                    )
                })
                .collect(),
        }
    }
}

impl From<&str> for Order {
    fn from(tokens: &str) -> Self {
        Self::Tokens(tokens.to_string())
    }
}

impl From<Vec<(String, Direction)>> for Order {
    fn from(pairs: Vec<(String, Direction)>) -> Self {
        Self::Pairs(pairs)
    }
}

/// A bundle of query/execution options.
///
/// Contexts are immutable by convention: built once through the `with_*`
/// methods, then read. Every accessor returns either the explicit value or
/// the registered default. Contexts are hashable so they can key caches;
/// `scope` never participates in equality or hashing.
#[derive(Clone, Default)]
pub struct Context {
    columns: Option<Vec<String>>,
    where_: Option<Filter>,
    order: Option<Vec<(String, Direction)>>,
    locale: Option<String>,
    expand: Option<Vec<String>>,
    distinct: bool,
    limit: Option<u64>,
    page_size: Option<u64>,
    page: Option<u64>,
    start: Option<u64>,
    namespace: Option<String>,
    returning: Returning,
    dry_run: bool,
    force: bool,
    scope: Option<Scope>,
    timezone: Option<String>,
    database: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_where(mut self, filter: Filter) -> Self {
        self.where_ = Some(filter);
        self
    }

    pub fn with_order(mut self, order: impl Into<Order>) -> Self {
        self.order = Some(order.into().normalize());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_expand(mut self, expand: impl Into<Expand>) -> Self {
        self.expand = Some(expand.into().normalize());
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_returning(mut self, returning: Returning) -> Self {
        self.returning = returning;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn where_clause(&self) -> Option<&Filter> {
        self.where_.as_ref()
    }

    pub fn order(&self) -> Option<&[(String, Direction)]> {
        self.order.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// The normalized flat list of dotted expansion paths.
    pub fn expand(&self) -> Option<&[String]> {
        self.expand.as_deref()
    }

    /// Folds the flat expansion list back into a nested path tree.
    pub fn expand_tree(&self) -> ExpandTree {
        let mut tree = ExpandTree::default();
        for path in self.expand.iter().flatten() {
            tree.insert_path(path);
        }
        tree
    }

    pub fn distinct(&self) -> bool {
        self.distinct
    }

    /// The effective limit: `page_size` when present, else the explicit
    /// limit.
    pub fn limit(&self) -> Option<u64> {
        self.page_size.or(self.limit)
    }

    /// The effective start offset: derived from `page` when present, else
    /// the explicit start.
    pub fn start(&self) -> Option<u64> {
        match self.page {
            Some(page) => Some((page.saturating_sub(1)) * self.limit().unwrap_or(0)),
            None => self.start,
        }
    }

    pub fn page(&self) -> Option<u64> {
        self.page
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn returning(&self) -> Returning {
        self.returning
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Builds the effective context over a base context.
    ///
    /// `where` predicates are ANDed, `columns` unioned preserving the base's
    /// order first; every other option falls back to the base when not set
    /// here.
    pub fn based_on(&self, base: &Context) -> Context {
        let mut out = self.clone();

        out.where_ = match (base.where_.clone(), self.where_.clone()) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (a, b) => a.or(b),
        };

        out.columns = match (&base.columns, &self.columns) {
            (Some(base_cols), Some(own_cols)) => {
                let mut merged = base_cols.clone();
                for col in own_cols {
                    if !merged.contains(col) {
                        merged.push(col.clone());
                    }
                }
                Some(merged)
            }
            (a, b) => a.clone().or_else(|| b.clone()),
        };

        macro_rules! inherit {
            ($field:ident) => {
                if out.$field.is_none() {
                    out.$field = base.$field.clone();
                }
            };
        }
        inherit!(order);
        inherit!(locale);
        inherit!(expand);
        inherit!(limit);
        inherit!(page_size);
        inherit!(page);
        inherit!(start);
        inherit!(namespace);
        inherit!(scope);
        inherit!(timezone);
        inherit!(database);

        out.distinct = self.distinct || base.distinct;
        out.dry_run = self.dry_run || base.dry_run;
        out.force = self.force || base.force;
        if self.returning == Returning::default() {
            out.returning = base.returning;
        }

        out
    }

    /// Resolves this context against the stack of scoped defaults.
    pub fn resolved(&self, stack: &ContextStack) -> Context {
        match stack.current() {
            Some(default) => self.based_on(&default),
            None => self.clone(),
        }
    }

    /// A stable hash over the non-default, hashable options. Used as a
    /// cache key component.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        // `scope` is opaque and intentionally excluded.
        self.columns == other.columns
            && self.where_ == other.where_
            && self.order == other.order
            && self.locale == other.locale
            && self.expand == other.expand
            && self.distinct == other.distinct
            && self.limit == other.limit
            && self.page_size == other.page_size
            && self.page == other.page
            && self.start == other.start
            && self.namespace == other.namespace
            && self.returning == other.returning
            && self.dry_run == other.dry_run
            && self.force == other.force
            && self.timezone == other.timezone
            && self.database == other.database
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.columns.hash(state);
        self.where_.hash(state);
        self.order.hash(state);
        self.locale.hash(state);
        self.expand.hash(state);
        self.distinct.hash(state);
        self.limit.hash(state);
        self.page_size.hash(state);
        self.page.hash(state);
        self.start.hash(state);
        self.namespace.hash(state);
        self.returning.hash(state);
        self.dry_run.hash(state);
        self.force.hash(state);
        self.timezone.hash(state);
        self.database.hash(state);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("columns", &self.columns)
            .field("where", &self.where_)
            .field("order", &self.order)
            .field("locale", &self.locale)
            .field("expand", &self.expand)
            .field("limit", &self.limit())
            .field("start", &self.start())
            .field("scope", &self.scope.as_ref().map(|_| "<scope>"))
            .finish_non_exhaustive()
    }
}

/// The per-thread stack of scoped default contexts.
///
/// Pushing returns a guard that pops on drop, so the prior top is restored
/// on every exit path, including unwinds. Readers take the lock only to
/// clone the current top.
#[derive(Default)]
pub struct ContextStack {
    inner: RwLock<HashMap<ThreadId, Vec<Context>>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current default context for this thread, if any.
    pub fn current(&self) -> Option<Context> {
        let inner = self.inner.read().unwrap();
        inner
            .get(&thread::current().id())
            .and_then(|stack| stack.last())
            .cloned()
    }

    /// Pushes a scoped default; the returned guard pops it when dropped.
    #[must_use = "dropping the guard immediately pops the context"]
    pub fn push(&self, context: Context) -> ContextScope<'_> {
        let mut inner = self.inner.write().unwrap();
        inner
            .entry(thread::current().id())
            .or_default()
            .push(context);
        ContextScope { stack: self }
    }

    fn pop(&self) {
        let mut inner = self.inner.write().unwrap();
        let id = thread::current().id();
        if let Some(stack) = inner.get_mut(&id) {
            stack.pop();
            if stack.is_empty() {
                inner.remove(&id);
            }
        }
    }
}

impl fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStack").finish_non_exhaustive()
    }
}

/// Guard for a scoped default context; pops on drop.
pub struct ContextScope<'a> {
    stack: &'a ContextStack,
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}
