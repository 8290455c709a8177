#[cfg(test)]
mod tests {
    use schemascope::cache::{CacheStore, MemoryCache};
    use schemascope::config::ConnectionConfig;
    use schemascope::connection::{Connection, ConnectionError, Value};
    use schemascope::test_utils::{rows, ScriptedConnection};
    use schemascope::{Column, Row, SchemaError, SchemaRegistry, Table};
    use serde_json::json;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const TABLES: &str = "INFORMATION_SCHEMA.TABLES";
    const COLUMNS: &str = "INFORMATION_SCHEMA.COLUMNS";
    const INDEXES: &str = "INFORMATION_SCHEMA.STATISTICS";
    const FOREIGN_KEYS: &str = "INFORMATION_SCHEMA.KEY_COLUMN_USAGE";

    fn respond(sql: &str, params: &[Value]) -> Result<Vec<Row>, ConnectionError> {
        let table = params.get(1).and_then(Value::as_str).unwrap_or_default();
        let result = if sql.contains(TABLES) {
            json!([
                {"name": "accounts", "engine": "InnoDB", "comment": ""},
                {"name": "users", "engine": "InnoDB", "comment": "People"},
                {"name": "zones", "engine": "MyISAM", "comment": ""}
            ])
        } else if sql.contains(COLUMNS) {
            json!([
                {"name": "id", "type": "bigint", "col_type": "bigint(20)", "nullable": "NO",
                 "col_default": null, "extra": "auto_increment"},
                {"name": format!("{}_name", table), "type": "varchar", "col_type": "varchar(80)",
                 "char_length": 80, "nullable": "YES", "col_default": null, "extra": ""}
            ])
        } else if sql.contains(INDEXES) {
            json!([
                {"name": "PRIMARY", "column_name": "id", "not_unique": 0, "type": "BTREE", "seq": 1}
            ])
        } else if sql.contains(FOREIGN_KEYS) {
            json!([])
        } else {
            return Err(ConnectionError::Query(format!("unexpected query: {}", sql)));
        };
        Ok(rows(result))
    }

    fn scripted(config: ConnectionConfig) -> (Arc<ScriptedConnection>, Arc<dyn Connection>) {
        let scripted = Arc::new(ScriptedConnection::new(config, respond));
        let connection: Arc<dyn Connection> = scripted.clone();
        (scripted, connection)
    }

    #[test]
    fn test_table_names_match_tables() {
        let (_, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();

        for name in schema.table_names().unwrap() {
            assert_eq!(schema.table(&name).unwrap().name(), name);
        }
        for name in ["", "USERS", "user", "app.users"] {
            let err = schema.table(name).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidTable(ref n) if n == name));
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn test_table_is_memoized() {
        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();

        let first = schema.table("users").unwrap();
        let second = schema.table("users").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(schema.has_table("zones").unwrap());
        schema.table_names().unwrap();
        assert_eq!(scripted.count_matching(TABLES), 1);

        let column = first.column("id").unwrap();
        assert!(Arc::ptr_eq(&column, &second.column("id").unwrap()));
        first.column_names().unwrap();
        first.has_column("users_name").unwrap();
        assert_eq!(scripted.count_matching(COLUMNS), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_load() {
        const THREADS: usize = 8;
        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        let barrier = Barrier::new(THREADS);

        let results: Vec<(Arc<Table>, Vec<String>, Arc<Column>)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        let users = schema.table("users").unwrap();
                        let names = users.column_names().unwrap();
                        let id = users.column("id").unwrap();
                        (users, names, id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(scripted.count_matching(TABLES), 1);
        assert_eq!(scripted.count_matching(COLUMNS), 1);
        let (users, names, id) = &results[0];
        assert_eq!(names, &vec!["id".to_string(), "users_name".to_string()]);
        for (table, other_names, column) in &results[1..] {
            assert!(Arc::ptr_eq(users, table));
            assert!(Arc::ptr_eq(id, column));
            assert_eq!(names, other_names);
        }
    }

    #[test]
    fn test_tables_iterator_builds_lazily() {
        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();

        let mut tables = schema.tables().unwrap();
        let (name, accounts) = tables.next().unwrap();
        assert_eq!(name, "accounts");
        assert!(Arc::ptr_eq(&accounts, &schema.table("accounts").unwrap()));
        drop(tables);

        // Restarting iterates from the beginning and shares built tables.
        let names: Vec<String> = schema.tables().unwrap().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["accounts", "users", "zones"]);
        assert_eq!(schema.tables().unwrap().count(), 3);
        assert_eq!(scripted.count_matching(TABLES), 1);
        assert_eq!(scripted.count_matching(COLUMNS), 0);
    }

    #[test]
    fn test_clear_while_iterating() {
        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();

        let mut tables = schema.tables().unwrap();
        let (_, before) = tables.next().unwrap();
        schema.clear();

        let rest: Vec<_> = tables.collect();
        assert_eq!(rest.len(), 2);
        assert_eq!(scripted.count_matching(TABLES), 1);

        let after = schema.table("accounts").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        let (_, users) = &rest[0];
        assert!(!Arc::ptr_eq(users, &schema.table("users").unwrap()));
        assert_eq!(scripted.count_matching(TABLES), 2);
    }

    #[test]
    fn test_table_clear_reloads_each_directory_once() {
        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        let users = schema.table("users").unwrap();

        users.column_names().unwrap();
        users.index_names().unwrap();
        users.foreign_key_names().unwrap();
        users.clear();

        users.column("id").unwrap();
        users.columns().unwrap().count();
        users.primary_key().unwrap();
        users.has_index("PRIMARY").unwrap();
        assert!(users.foreign_keys().unwrap().next().is_none());

        assert_eq!(scripted.count_matching(COLUMNS), 2);
        assert_eq!(scripted.count_matching(INDEXES), 2);
        assert_eq!(scripted.count_matching(FOREIGN_KEYS), 2);
        assert_eq!(scripted.count_matching(TABLES), 1);
    }

    #[test]
    fn test_schema_clear_keeps_table_caches() {
        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = registry.use_schema(&connection).unwrap();
        schema.table("users").unwrap().column_names().unwrap();
        assert_eq!(cache.keys(), vec!["app.tables", "app.users.columns"]);

        schema.clear();
        assert_eq!(cache.keys(), vec!["app.users.columns"]);

        // Table directory is re-read, columns come from the cache.
        schema.table("users").unwrap().column_names().unwrap();
        assert_eq!(scripted.count_matching(TABLES), 2);
        assert_eq!(scripted.count_matching(COLUMNS), 1);
    }

    #[test]
    fn test_cache_is_shared_between_schemas() {
        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let (first, a) = scripted(ConnectionConfig::mysql("app"));
        let (second, b) = scripted(ConnectionConfig::mysql("app"));

        let users = registry.use_schema(&a).unwrap().table("users").unwrap();
        assert_eq!(users.column_names().unwrap(), vec!["id", "users_name"]);
        assert_eq!(first.query_count(), 2);

        let users = registry.use_schema(&b).unwrap().table("users").unwrap();
        assert_eq!(users.column_names().unwrap(), vec!["id", "users_name"]);
        assert!(users.has_auto_increment().unwrap());
        assert_eq!(second.query_count(), 0);
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let (_, a) = scripted(ConnectionConfig::mysql("app"));
        let (_, b) = scripted(ConnectionConfig::mysql("app").with_cache_key_prefix("tenant:7"));
        let (_, c) = scripted(ConnectionConfig::mysql("reports"));

        let prefixes: Vec<String> = [&a, &b, &c]
            .into_iter()
            .map(|connection| {
                let schema = registry.use_schema(connection).unwrap();
                schema.table_names().unwrap();
                schema.cache_prefix().to_string()
            })
            .collect();

        assert_eq!(prefixes, vec!["app", "tenant_7.app", "reports"]);
        assert_eq!(
            cache.keys(),
            vec!["app.tables", "reports.tables", "tenant_7.app.tables"]
        );
    }

    #[test]
    fn test_cached_metadata_outlives_connection() {
        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let (scripted, connection) = scripted(ConnectionConfig::mysql("app"));
        let schema = registry.use_schema(&connection).unwrap();
        let users = schema.table("users").unwrap();
        users.column_names().unwrap();
        drop(scripted);
        drop(connection);

        assert!(users.has_column("id").unwrap());
        assert!(matches!(
            users.index_names(),
            Err(SchemaError::ConnectionFailure(ConnectionError::Closed))
        ));
    }
}
