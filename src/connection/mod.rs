//! Catalog connection abstraction.
//!
//! Reflection never owns a connection. It borrows a [`Connection`] to run
//! catalog queries and reads the configuration that scopes those queries.

mod sqlite;

pub use sqlite::SqliteConnection;

use crate::config::ConnectionConfig;

/// Query parameter and result cell type.
pub type Value = serde_json::Value;

/// Errors raised by the query layer.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("connection closed")]
    Closed,

    #[error("malformed catalog row: missing {0}")]
    MissingField(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A live database connection.
pub trait Connection: Send + Sync {
    /// The connection's type name followed by its ancestors, nearest first.
    ///
    /// The registry walks this chain to pick a reader, so a specialised
    /// connection (e.g. `["mysql-replica", "mysql"]`) resolves to the reader
    /// registered for its closest ancestor.
    fn type_chain(&self) -> Vec<&'static str>;

    /// Configuration the connection was opened with.
    fn config(&self) -> &ConnectionConfig;

    /// Run a query with positional parameters and collect every row.
    ///
    /// Placeholders use the dialect's native syntax (`?` for MySQL and
    /// SQLite, `$1` for Postgres).
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ConnectionError>;
}

/// One result row: column names mapped to values, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.cells.push((column.into(), value));
    }

    /// Raw value of a column. Column names match case-insensitively, since
    /// some catalogs upper-case them and others do not.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Value at a select-list position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).map(|(_, value)| value)
    }

    /// Column value as text. Numbers and booleans are rendered; NULL is `None`.
    pub fn get_str(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn get_u32(&self, column: &str) -> Option<u32> {
        self.get_i64(column).and_then(|n| u32::try_from(n).ok())
    }

    /// Column value as a flag. Accepts booleans, non-zero numbers and the
    /// textual forms catalogs use (`YES`/`NO`, `t`/`f`, `true`/`false`).
    pub fn get_bool(&self, column: &str) -> bool {
        match self.get(column) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(
                s.to_ascii_lowercase().as_str(),
                "1" | "yes" | "y" | "t" | "true" | "on"
            ),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
