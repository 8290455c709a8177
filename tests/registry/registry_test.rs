#[cfg(test)]
mod tests {
    use schemascope::cache::{CacheStore, MemoryCache};
    use schemascope::config::{ConnectionConfig, Driver};
    use schemascope::connection::{Connection, ConnectionError};
    use schemascope::test_utils::ScriptedConnection;
    use schemascope::{Dialect, SchemaError, SchemaRegistry};
    use std::sync::Arc;

    fn connection(driver: Driver, chain: &[&'static str]) -> Arc<dyn Connection> {
        let config = ConnectionConfig::new(driver, "app");
        let scripted = ScriptedConnection::new(config, |_, _| Ok(Vec::new())).with_type_chain(chain);
        Arc::new(scripted)
    }

    #[test]
    fn test_exact_type_resolves() {
        let registry = SchemaRegistry::new();
        for (driver, dialect) in [
            (Driver::MySql, Dialect::MySql),
            (Driver::Postgres, Dialect::Postgres),
            (Driver::Sqlite, Dialect::Sqlite),
        ] {
            let connection = connection(driver, &[dialect.name()]);
            assert_eq!(registry.use_schema(&connection).unwrap().dialect(), dialect);
        }
    }

    #[test]
    fn test_subtype_resolves_to_nearest_ancestor() {
        let registry = SchemaRegistry::new();

        let replica = connection(Driver::Postgres, &["replica", "pooled", "postgres"]);
        assert_eq!(registry.use_schema(&replica).unwrap().dialect(), Dialect::Postgres);

        // A registration on an intermediate ancestor wins over the root.
        registry.map("pooled", Dialect::MySql.reader());
        let other = connection(Driver::Postgres, &["replica", "pooled", "postgres"]);
        assert_eq!(registry.use_schema(&other).unwrap().dialect(), Dialect::MySql);

        // Schemas handed out earlier keep their reader.
        assert_eq!(registry.use_schema(&replica).unwrap().dialect(), Dialect::Postgres);
    }

    #[test]
    fn test_unrelated_type_is_missing_handler() {
        let registry = SchemaRegistry::new();
        let connection = connection(Driver::MySql, &["oracle", "jdbc"]);

        let err = registry.use_schema(&connection).unwrap_err();
        assert!(matches!(err, SchemaError::MissingHandler(ref t) if t == "oracle"));
        assert_eq!(err.to_string(), "missing handler for connection type: oracle");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handler_lookup_without_building() {
        let registry = SchemaRegistry::empty();
        let connection = connection(Driver::MySql, &["mariadb", "mysql"]);
        assert!(registry.handler_for(connection.as_ref()).is_err());

        registry.map("mysql", Dialect::MySql.reader());
        let reader = registry.handler_for(connection.as_ref()).unwrap();
        assert_eq!(reader.dialect(), Dialect::MySql);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identity_not_value() {
        let registry = SchemaRegistry::new();
        let a = connection(Driver::MySql, &["mysql"]);
        let b = connection(Driver::MySql, &["mysql"]);
        assert_eq!(a.config(), b.config());

        let schema_a = registry.use_schema(&a).unwrap();
        let schema_b = registry.use_schema(&b).unwrap();
        assert!(!Arc::ptr_eq(&schema_a, &schema_b));

        let alias = Arc::clone(&a);
        assert!(Arc::ptr_eq(&schema_a, &registry.use_schema(&alias).unwrap()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_does_not_keep_connections_alive() {
        let registry = SchemaRegistry::new();
        let connection = connection(Driver::Sqlite, &["sqlite"]);
        let weak = Arc::downgrade(&connection);

        let schema = registry.use_schema(&connection).unwrap();
        drop(connection);

        assert!(weak.upgrade().is_none());
        assert_eq!(registry.len(), 0);
        assert!(matches!(
            schema.connection(),
            Err(SchemaError::ConnectionFailure(ConnectionError::Closed))
        ));

        // A new connection gets a new schema.
        let fresh = self::connection(Driver::Sqlite, &["sqlite"]);
        let rebuilt = registry.use_schema(&fresh).unwrap();
        assert!(!Arc::ptr_eq(&schema, &rebuilt));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.prune(), 0);
    }

    #[test]
    fn test_cache_is_handed_to_new_schemas() {
        let registry = SchemaRegistry::new();
        let before = registry.use_schema(&connection(Driver::MySql, &["mysql"])).unwrap();
        assert!(before.cache().is_none());

        let store: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        registry.set_cache(Some(store));
        assert!(registry.cache().is_some());
        let connection = connection(Driver::MySql, &["mysql"]);
        let after = registry.use_schema(&connection).unwrap();
        assert!(after.cache().is_some());
    }
}
