//! Metadata cache.
//!
//! Reflected catalog metadata is stored as JSON text under string keys so
//! that repeated reflection of the same database skips the catalog queries.
//! Any number of `Schema` instances may share one store.
//!
//! # Key Format
//!
//! ```text
//! {namespace}.tables                  -> {name: TableData, ...}
//! {namespace}.{table}.columns         -> {name: ColumnData, ...}
//! {namespace}.{table}.indexes         -> {name: IndexData, ...}
//! {namespace}.{table}.foreign_keys    -> {name: ForeignKeyData, ...}
//! ```
//!
//! `namespace` is `[{cache_key_prefix}.]{database}` with `:` replaced by `_`.

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::{CacheStats, SqliteCache};

use serde::{de::DeserializeOwned, Serialize};

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A key/value store for serialized metadata.
pub trait CacheStore: Send + Sync {
    /// Get the JSON payload stored under `key`.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a JSON payload, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Remove `key`. Returns true if something was removed.
    fn delete(&self, key: &str) -> CacheResult<bool>;
}

/// Get the value stored under `key`, or compute it with `producer` and store it.
///
/// The store is best effort: a failed read or an undecodable payload falls
/// through to `producer`, and a failed write still returns the computed
/// value. Producer errors are returned as is and nothing is stored.
pub fn remember<T, E, F>(store: &dyn CacheStore, key: &str, producer: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T, E>,
{
    match store.get(key) {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(value) => {
                tracing::debug!(key, "metadata cache hit");
                return Ok(value);
            }
            Err(error) => {
                tracing::warn!(key, %error, "discarding undecodable cache entry");
            }
        },
        Ok(None) => tracing::debug!(key, "metadata cache miss"),
        Err(error) => tracing::warn!(key, %error, "metadata cache read failed"),
    }

    let value = producer()?;

    match serde_json::to_string(&value) {
        Ok(payload) => {
            if let Err(error) = store.set(key, &payload) {
                tracing::warn!(key, %error, "metadata cache write failed");
            }
        }
        Err(error) => tracing::warn!(key, %error, "metadata is not serializable"),
    }

    Ok(value)
}

/// Helper for generating cache keys.
pub struct CacheKey;

impl CacheKey {
    /// Namespace for one database. `:` is not allowed in keys of some
    /// backends, so it is replaced by `_`.
    pub fn namespace(prefix: Option<&str>, database: &str) -> String {
        let raw = match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, database),
            _ => database.to_string(),
        };
        raw.replace(':', "_")
    }

    /// Key for the table directory.
    pub fn tables(namespace: &str) -> String {
        format!("{}.tables", namespace)
    }

    /// Key for a table's column directory.
    pub fn columns(namespace: &str, table: &str) -> String {
        format!("{}.{}.columns", namespace, table)
    }

    /// Key for a table's index directory.
    pub fn indexes(namespace: &str, table: &str) -> String {
        format!("{}.{}.indexes", namespace, table)
    }

    /// Key for a table's foreign key directory.
    pub fn foreign_keys(namespace: &str, table: &str) -> String {
        format!("{}.{}.foreign_keys", namespace, table)
    }
}
