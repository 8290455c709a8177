//! rusqlite-backed [`Connection`].

use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};

use super::{Connection, ConnectionError, Row, Value};
use crate::config::ConnectionConfig;

/// An embedded SQLite database exposed through the [`Connection`] trait.
pub struct SqliteConnection {
    conn: Mutex<rusqlite::Connection>,
    config: ConnectionConfig,
}

impl SqliteConnection {
    /// Open the database file named by `config.database` (`:memory:` or
    /// empty opens a private in-memory database).
    pub fn open(config: ConnectionConfig) -> Result<Self, ConnectionError> {
        let conn = if config.database.is_empty() || config.database == ":memory:" {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(&config.database)?
        };
        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        Self::open(ConnectionConfig::sqlite(":memory:"))
    }

    /// Run one or more statements without collecting results (DDL, fixtures).
    pub fn execute_batch(&self, sql: &str) -> Result<(), ConnectionError> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Connection for SqliteConnection {
    fn type_chain(&self) -> Vec<&'static str> {
        vec!["sqlite"]
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ConnectionError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter().map(to_sql_value)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                record.push(name.as_str(), from_value_ref(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
