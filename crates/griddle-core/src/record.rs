use crate::Value;

use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;

/// One entity instance: column values plus per-locale values for
/// translatable columns, with dirty tracking for updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entity: String,
    values: IndexMap<String, Value>,
    translations: BTreeMap<String, IndexMap<String, Value>>,
    changes: IndexSet<String>,
    translation_changes: IndexSet<(String, String)>,
    from_storage: bool,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Sets a column value and marks it changed.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        self.values.insert(column.clone(), value.into());
        self.changes.insert(column);
    }

    /// Sets a locale-specific value for a translatable column.
    pub fn set_translation(
        &mut self,
        locale: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) {
        let locale = locale.into();
        let column = column.into();
        self.translations
            .entry(locale.clone())
            .or_default()
            .insert(column.clone(), value.into());
        self.translation_changes.insert((locale, column));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Every locale's values, keyed by locale then column.
    pub fn translations(&self) -> &BTreeMap<String, IndexMap<String, Value>> {
        &self.translations
    }

    /// Every locale's value for one translatable column.
    pub fn translations_for(&self, column: &str) -> BTreeMap<&str, &Value> {
        self.translations
            .iter()
            .filter_map(|(locale, values)| {
                values.get(column).map(|value| (locale.as_str(), value))
            })
            .collect()
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn id(&self) -> Option<&Value> {
        self.values.get("id")
    }

    /// Whether this instance maps to a persisted row.
    pub fn is_record(&self) -> bool {
        self.from_storage || self.id().map(|id| !id.is_null_like()).unwrap_or(false)
    }

    /// Marks the record as loaded from storage and clears dirty tracking.
    pub fn mark_loaded(&mut self) {
        self.from_storage = true;
        self.changes.clear();
        self.translation_changes.clear();
    }

    /// Changed standard column names, in change order.
    pub fn changes(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(String::as_str)
    }

    /// Changed `(locale, column)` pairs for translatable columns.
    pub fn translation_changes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.translation_changes
            .iter()
            .map(|(locale, column)| (locale.as_str(), column.as_str()))
    }

    /// Locales with at least one modified translatable value.
    pub fn changed_locales(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![];
        for (locale, _) in self.translation_changes() {
            if !out.contains(&locale) {
                out.push(locale);
            }
        }
        out
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || !self.translation_changes.is_empty()
    }
}

/// An ordered set of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// The identity of every record, in order.
    pub fn ids(&self) -> Vec<Value> {
        self.records
            .iter()
            .filter_map(|record| record.id().cloned())
            .collect()
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl IntoIterator for Collection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_tracking() {
        let mut record = Record::new("User");
        record.set("name", "bob");
        record.set_translation("en_US", "bio", "hello");
        record.set_translation("fr_FR", "bio", "bonjour");

        assert_eq!(record.changes().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(record.changed_locales(), vec!["en_US", "fr_FR"]);

        record.mark_loaded();
        assert!(!record.has_changes());
        assert!(record.is_record());
    }

    #[test]
    fn translations_for_column() {
        let mut record = Record::new("Page");
        record.set_translation("en_US", "title", "Home");
        record.set_translation("fr_FR", "title", "Accueil");
        record.set_translation("fr_FR", "body", "...");

        let titles = record.translations_for("title");
        assert_eq!(titles.len(), 2);
        assert_eq!(titles["fr_FR"], &Value::String("Accueil".into()));
    }
}
