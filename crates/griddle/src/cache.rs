use griddle_core::{Collection, Value};

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Keys one cached relation result: the owning record's identity, the hash
/// of the lookup options, and the logical database the result came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_id: Value,
    pub options: u64,
    pub database: String,
}

struct CacheEntry {
    collection: Collection,
    stored_at: Instant,
    timeout: Option<Duration>,
}

impl CacheEntry {
    fn expired(&self) -> bool {
        match self.timeout {
            Some(timeout) => self.stored_at.elapsed() >= timeout,
            None => false,
        }
    }
}

/// Keyed result cache for reverse-lookup and pipe relations.
///
/// Shared across threads; concurrent population of the same key is not
/// deduplicated, the last writer wins. Entries expire by timeout or by
/// explicit invalidation.
#[derive(Default)]
pub struct RelationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached collection for a key, unless missing or expired.
    pub fn get(&self, key: &CacheKey) -> Option<Collection> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if !entry.expired() => Some(entry.collection.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, collection: Collection, timeout: Option<Duration>) {
        self.entries.lock().unwrap().insert(
            key,
            CacheEntry {
                collection,
                stored_at: Instant::now(),
                timeout,
            },
        );
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use griddle_core::Record;

    fn key(id: i64) -> CacheKey {
        CacheKey {
            record_id: Value::I64(id),
            options: 0,
            database: "test".into(),
        }
    }

    #[test]
    fn entries_expire_by_timeout() {
        let cache = RelationCache::new();
        let mut collection = Collection::new();
        collection.push(Record::new("User"));

        cache.insert(key(1), collection, Some(Duration::from_millis(0)));
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn entries_without_timeout_persist() {
        let cache = RelationCache::new();
        cache.insert(key(1), Collection::new(), None);
        assert!(cache.get(&key(1)).is_some());

        cache.invalidate(&key(1));
        assert!(cache.get(&key(1)).is_none());
    }
}
