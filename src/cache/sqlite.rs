//! SQLite-backed persistent cache.
//!
//! - Simple key-value store with JSON values
//! - No TTL, entries persist until deleted
//! - Versioned, auto-clears on version mismatch

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheResult, CacheStore};

/// Current cache format version. Bump this when the stored metadata shape changes.
const CACHE_VERSION: i32 = 1;

/// Persistent cache store in a SQLite file.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open or create the cache database at `path`.
    ///
    /// Parent directories are created as needed. If the stored version does
    /// not match, every entry is dropped.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let cache = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        cache.init()?;
        tracing::debug!(path = %path.display(), "opened metadata cache");
        Ok(cache)
    }

    /// Open an in-memory cache.
    pub fn open_in_memory() -> CacheResult<Self> {
        let cache = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        cache.init()?;
        Ok(cache)
    }

    fn init(&self) -> CacheResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        if stored_version != Some(CACHE_VERSION) {
            if stored_version.is_some() {
                tracing::info!(
                    stored = ?stored_version,
                    current = CACHE_VERSION,
                    "cache version changed, clearing entries"
                );
                conn.execute("DELETE FROM cache", [])?;
            }
            conn.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
                params![CACHE_VERSION.to_string()],
            )?;
        }

        Ok(())
    }

    /// Delete all entries whose key starts with `prefix`.
    pub fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let rows = self.conn.lock().execute(
            "DELETE FROM cache WHERE key LIKE ? ESCAPE '\\'",
            params![like_prefix(prefix)],
        )?;
        Ok(rows)
    }

    /// List all keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM cache WHERE key LIKE ? ESCAPE '\\' ORDER BY key")?;
        let keys = stmt
            .query_map(params![like_prefix(prefix)], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Clear all cache entries (but keep metadata).
    pub fn clear_all(&self) -> CacheResult<()> {
        self.conn.lock().execute("DELETE FROM cache", [])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let conn = self.conn.lock();
        let (entry_count, total_size): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(value)), 0) FROM cache",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CacheStats {
            entry_count: entry_count as usize,
            total_size_bytes: total_size as usize,
        })
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM cache WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO cache (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let rows = self
            .conn
            .lock()
            .execute("DELETE FROM cache WHERE key = ?", params![key])?;
        Ok(rows > 0)
    }
}

/// `LIKE` pattern matching keys that start with `prefix`. Namespaces use `_`
/// as a separator replacement, so wildcards must be escaped.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries in the cache.
    pub entry_count: usize,
    /// Total size of all values in bytes.
    pub total_size_bytes: usize,
}
