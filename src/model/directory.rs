//! Insertion-ordered name → record map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named metadata records in catalog order.
///
/// Serialized as a JSON object whose key order matches insertion order, so a
/// directory read back from the cache iterates exactly like the one that was
/// reflected. Equality compares contents and ignores order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for Directory<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> Directory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace a record. A replaced record keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        self.entries.insert(name.into(), value);
    }

    /// Get the record for `name`, appending one built by `init` if absent.
    ///
    /// Readers use this to group several catalog rows into one record.
    pub fn entry_or_insert_with(&mut self, name: &str, init: impl FnOnce() -> T) -> &mut T {
        self.entries.entry(name.to_string()).or_insert_with(init)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Name at a position.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get_index(index).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T, K: Into<String>> FromIterator<(K, T)> for Directory<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}
