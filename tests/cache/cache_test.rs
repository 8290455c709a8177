#[cfg(test)]
mod tests {
    use schemascope::cache::{CacheKey, CacheStore, MemoryCache, SqliteCache};
    use schemascope::config::{ConnectionConfig, Settings};
    use schemascope::connection::{Connection, SqliteConnection};
    use schemascope::SchemaRegistry;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "schemascope-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn shop(prefix: Option<&str>) -> Arc<dyn Connection> {
        let mut config = ConnectionConfig::sqlite(":memory:");
        if let Some(prefix) = prefix {
            config = config.with_cache_key_prefix(prefix);
        }
        shop_at(config)
    }

    fn shop_at(config: ConnectionConfig) -> Arc<dyn Connection> {
        let connection = SqliteConnection::open(config).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL);
                 CREATE TABLE posts (
                     id INTEGER PRIMARY KEY,
                     user_id INTEGER REFERENCES users(id)
                 );",
            )
            .unwrap();
        Arc::new(connection)
    }

    fn sqlite_file(path: &Path) -> ConnectionConfig {
        ConnectionConfig::sqlite(path.to_string_lossy().into_owned())
    }

    #[test]
    fn test_persistent_cache_survives_reopen() {
        let dir = scratch_dir("persist");
        let path = dir.join("nested").join("cache.db");
        let database = dir.join("shop.db");
        std::fs::create_dir_all(&dir).unwrap();
        let namespace = CacheKey::namespace(None, &database.to_string_lossy());

        {
            let store: Arc<dyn CacheStore> = Arc::new(SqliteCache::open(&path).unwrap());
            let registry = SchemaRegistry::new();
            registry.set_cache(Some(store));

            let connection = shop_at(sqlite_file(&database));
            let schema = registry.use_schema(&connection).unwrap();
            assert_eq!(schema.cache_prefix(), namespace);
            let posts = schema.table("posts").unwrap();
            posts.column_names().unwrap();
            posts.foreign_key_names().unwrap();
        }

        // The same file recreated without tables answers from the stored metadata.
        std::fs::remove_file(&database).unwrap();
        let cache = Arc::new(SqliteCache::open(&path).unwrap());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let connection: Arc<dyn Connection> =
            Arc::new(SqliteConnection::open(sqlite_file(&database)).unwrap());
        let schema = registry.use_schema(&connection).unwrap();
        assert_eq!(schema.table_names().unwrap(), vec!["posts", "users"]);
        let posts = schema.table("posts").unwrap();
        assert_eq!(posts.column_names().unwrap(), vec!["id", "user_id"]);
        assert_eq!(posts.foreign_key_names().unwrap(), vec!["posts_user_id"]);

        // Indexes were never stored, so they come from the empty database.
        assert!(posts.index_names().unwrap().is_empty());
        assert_eq!(
            cache.keys_with_prefix(&format!("{}.", namespace)).unwrap(),
            vec![
                format!("{}.posts.columns", namespace),
                format!("{}.posts.foreign_keys", namespace),
                format!("{}.posts.indexes", namespace),
                format!("{}.tables", namespace),
            ]
        );

        drop(schema);
        drop(connection);
        drop(cache);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalidating_one_namespace() {
        let cache = Arc::new(SqliteCache::open_in_memory().unwrap());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let default = shop(None);
        let tenant = shop(Some("tenant:1"));
        for connection in [&default, &tenant] {
            let schema = registry.use_schema(connection).unwrap();
            schema.table("users").unwrap().column_names().unwrap();
        }

        let namespace = CacheKey::namespace(Some("tenant:1"), ":memory:");
        assert_eq!(namespace, "tenant_1._memory_");
        assert_eq!(
            cache.keys_with_prefix(&namespace).unwrap(),
            vec!["tenant_1._memory_.tables", "tenant_1._memory_.users.columns"]
        );

        assert_eq!(cache.delete_prefix(&format!("{}.", namespace)).unwrap(), 2);
        assert_eq!(cache.stats().unwrap().entry_count, 2);
        assert!(cache.get("_memory_.users.columns").unwrap().is_some());
    }

    #[test]
    fn test_sqlite_files_do_not_share_namespace() {
        let dir = scratch_dir("files");
        std::fs::create_dir_all(&dir).unwrap();
        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let mut schemas = Vec::new();
        for table in ["alpha", "beta"] {
            let path = dir.join(format!("{}.db", table));
            let connection = SqliteConnection::open(sqlite_file(&path)).unwrap();
            connection
                .execute_batch(&format!("CREATE TABLE {} (id INTEGER PRIMARY KEY)", table))
                .unwrap();
            let connection: Arc<dyn Connection> = Arc::new(connection);
            let schema = registry.use_schema(&connection).unwrap();
            schemas.push((connection, schema));
        }

        let (_, alpha) = &schemas[0];
        let (_, beta) = &schemas[1];
        assert_ne!(alpha.cache_prefix(), beta.cache_prefix());
        assert_eq!(alpha.table_names().unwrap(), vec!["alpha"]);
        assert_eq!(beta.table_names().unwrap(), vec!["beta"]);
        assert_eq!(beta.table("beta").unwrap().column_names().unwrap(), vec!["id"]);
        assert!(matches!(
            alpha.table("beta"),
            Err(schemascope::SchemaError::InvalidTable(_))
        ));

        assert!(cache.contains(&format!("{}.tables", alpha.cache_prefix())));
        assert!(cache.contains(&format!("{}.tables", beta.cache_prefix())));

        drop(schemas);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_undecodable_entry_is_replaced() {
        let cache = Arc::new(SqliteCache::open_in_memory().unwrap());
        cache.set("_memory_.tables", "{\"users\": 42").unwrap();
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let connection = shop(None);
        let schema = registry.use_schema(&connection).unwrap();
        assert_eq!(schema.table_names().unwrap(), vec!["posts", "users"]);

        let payload = cache.get("_memory_.tables").unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert!(stored.get("posts").is_some());
        assert!(stored.get("users").is_some());
    }

    #[test]
    fn test_settings_open_sqlite_cache() {
        let dir = scratch_dir("settings");
        let path = dir.join("cache.db");
        let settings = Settings::from_toml(&format!(
            "[cache]\nbackend = \"sqlite\"\npath = \"{}\"\n",
            path.display()
        ))
        .unwrap();

        let store = settings.build_cache().unwrap().unwrap();
        store.set("main.tables", "{}").unwrap();
        assert!(path.exists());
        assert_eq!(store.get("main.tables").unwrap().as_deref(), Some("{}"));

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
