//! Test helpers: a scripted fake connection and SQL validation.

use parking_lot::Mutex;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, ConnectionError, Row, Value};
use crate::dialect::Dialect;

type Responder = dyn Fn(&str, &[Value]) -> Result<Vec<Row>, ConnectionError> + Send + Sync;

/// A connection that answers queries from a closure and records every query.
pub struct ScriptedConnection {
    config: ConnectionConfig,
    type_chain: Vec<&'static str>,
    responder: Box<Responder>,
    log: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    /// The type chain defaults to the configured driver's name.
    pub fn new<F>(config: ConnectionConfig, responder: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<Vec<Row>, ConnectionError> + Send + Sync + 'static,
    {
        Self {
            type_chain: vec![config.driver.as_str()],
            config,
            responder: Box::new(responder),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Report a custom type chain, own type first.
    pub fn with_type_chain(mut self, chain: &[&'static str]) -> Self {
        self.type_chain = chain.to_vec();
        self
    }

    /// Every query issued so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Number of queries containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.log.lock().iter().filter(|sql| sql.contains(needle)).count()
    }

    pub fn reset(&self) {
        self.log.lock().clear();
    }
}

impl Connection for ScriptedConnection {
    fn type_chain(&self) -> Vec<&'static str> {
        self.type_chain.clone()
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ConnectionError> {
        self.log.lock().push(sql.to_string());
        (self.responder)(sql, params)
    }
}

/// Build rows from a JSON array of objects.
pub fn rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map.into_iter().collect(),
                _ => Row::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Check that `sql` parses for the given dialect.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}
