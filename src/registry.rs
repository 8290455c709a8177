//! Connection → schema registry.
//!
//! The registry hands out one [`Schema`] per live connection and decides
//! which dialect reader a connection gets. Handlers are registered by
//! connection type name; a connection reports its own type followed by its
//! ancestors (see [`Connection::type_chain`]) and the first registered name
//! wins, so a specialised connection type falls back to its base dialect.
//!
//! Connections are held weakly. An entry whose connection has been dropped
//! is evicted on the next lookup or [`SchemaRegistry::prune`].
//!
//! ```ignore
//! let registry = SchemaRegistry::new();
//! registry.map("mariadb", Dialect::MySql.reader());
//! registry.set_cache(Some(Arc::new(MemoryCache::new())));
//!
//! let schema = registry.use_schema(&connection)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::cache::CacheStore;
use crate::connection::Connection;
use crate::dialect::{Dialect, SchemaReader};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;

struct Entry {
    connection: Weak<dyn Connection>,
    schema: Arc<Schema>,
}

impl Entry {
    fn is_alive(&self) -> bool {
        self.connection.strong_count() > 0
    }

    fn belongs_to(&self, connection: &Arc<dyn Connection>) -> bool {
        self.is_alive() && same_connection(self.connection.as_ptr(), Arc::as_ptr(connection))
    }
}

/// Compare connection identity by address, ignoring vtables.
fn same_connection(a: *const dyn Connection, b: *const dyn Connection) -> bool {
    std::ptr::eq(a as *const (), b as *const ())
}

/// Resolves and memoizes the schema of each connection.
pub struct SchemaRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn SchemaReader>>>,
    entries: Mutex<Vec<Entry>>,
    cache: RwLock<Option<Arc<dyn CacheStore>>>,
}

impl SchemaRegistry {
    /// A registry with the built-in dialects registered under their names.
    pub fn new() -> Self {
        let registry = Self::empty();
        for dialect in Dialect::ALL {
            registry.map(dialect.name(), dialect.reader());
        }
        registry
    }

    /// A registry without any handler.
    pub fn empty() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            entries: Mutex::new(Vec::new()),
            cache: RwLock::new(None),
        }
    }

    /// Register or replace the reader used for a connection type.
    ///
    /// Schemas already handed out keep the reader they were built with.
    pub fn map(&self, connection_type: impl Into<String>, reader: Arc<dyn SchemaReader>) {
        let connection_type = connection_type.into();
        tracing::debug!(
            connection_type = %connection_type,
            handler = %reader.dialect(),
            "registered schema handler"
        );
        self.handlers.write().insert(connection_type, reader);
    }

    /// Cache store given to every schema built from now on.
    pub fn set_cache(&self, cache: Option<Arc<dyn CacheStore>>) {
        *self.cache.write() = cache;
    }

    pub fn cache(&self) -> Option<Arc<dyn CacheStore>> {
        self.cache.read().clone()
    }

    /// The schema of `connection`, built on first request.
    pub fn use_schema(&self, connection: &Arc<dyn Connection>) -> SchemaResult<Arc<Schema>> {
        let mut entries = self.entries.lock();
        entries.retain(Entry::is_alive);

        if let Some(entry) = entries.iter().find(|entry| entry.belongs_to(connection)) {
            return Ok(Arc::clone(&entry.schema));
        }

        let schema = Arc::new(self.build(connection)?);
        entries.push(Entry {
            connection: Arc::downgrade(connection),
            schema: Arc::clone(&schema),
        });
        Ok(schema)
    }

    /// Build a new, unregistered schema for `connection`.
    pub fn build(&self, connection: &Arc<dyn Connection>) -> SchemaResult<Schema> {
        let reader = self.handler_for(connection.as_ref())?;
        Ok(Schema::new(connection, reader, self.cache()))
    }

    /// Walk the connection's type chain and return the first registered reader.
    pub fn handler_for(&self, connection: &dyn Connection) -> SchemaResult<Arc<dyn SchemaReader>> {
        let chain = connection.type_chain();
        let handlers = self.handlers.read();

        for connection_type in &chain {
            if let Some(reader) = handlers.get(*connection_type) {
                tracing::debug!(
                    connection_type = *connection_type,
                    handler = %reader.dialect(),
                    "resolved schema handler"
                );
                return Ok(Arc::clone(reader));
            }
        }

        let own_type = chain.first().copied().unwrap_or("unknown");
        Err(SchemaError::MissingHandler(own_type.to_string()))
    }

    /// Number of live connections with a schema.
    pub fn len(&self) -> usize {
        self.entries.lock().iter().filter(|entry| entry.is_alive()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict entries whose connection has been dropped. Returns how many were evicted.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(Entry::is_alive);
        before - entries.len()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<String> = self.handlers.read().keys().cloned().collect();
        handlers.sort();
        f.debug_struct("SchemaRegistry")
            .field("handlers", &handlers)
            .field("entries", &self.entries.lock().len())
            .field("cached", &self.cache.read().is_some())
            .finish()
    }
}
