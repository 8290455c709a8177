#[cfg(test)]
mod tests {
    use schemascope::cache::{CacheStore, MemoryCache};
    use schemascope::connection::{Connection, SqliteConnection};
    use schemascope::{ReferentialAction, SchemaRegistry, SemanticType};
    use serde_json::json;
    use std::sync::Arc;

    const DDL: &str = "
        CREATE TABLE customers (
            id INTEGER PRIMARY KEY,
            email VARCHAR(120) NOT NULL UNIQUE,
            balance DECIMAL(10,2) DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            status TEXT DEFAULT 'active',
            flags UNSIGNED INT(4)
        );
        CREATE TABLE regions (
            region TEXT,
            code TEXT,
            PRIMARY KEY (region, code)
        );
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
            region TEXT,
            code TEXT,
            FOREIGN KEY (region, code) REFERENCES regions(region, code) ON UPDATE SET NULL
        );
        CREATE INDEX orders_region_code ON orders (region, code);
        CREATE UNIQUE INDEX orders_customer ON orders (customer_id, id);
        CREATE TABLE notes (
            body TEXT,
            author_id INTEGER REFERENCES customers
        );
    ";

    fn connection() -> Arc<dyn Connection> {
        let connection = SqliteConnection::open_in_memory().unwrap();
        connection.execute_batch(DDL).unwrap();
        Arc::new(connection)
    }

    #[test]
    fn test_table_names() {
        let connection = connection();
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        assert_eq!(
            schema.table_names().unwrap(),
            vec!["customers", "notes", "orders", "regions"]
        );
        assert!(schema.table("customers").unwrap().comment().is_none());
    }

    #[test]
    fn test_single_primary_key_is_auto_increment() {
        let connection = connection();
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        let customers = schema.table("customers").unwrap();

        let id = customers.column("id").unwrap();
        assert!(id.is_auto_increment());
        assert!(!id.is_nullable());
        assert_eq!(id.semantic_type(), SemanticType::Integer);
        assert!(customers.has_auto_increment().unwrap());

        let regions = schema.table("regions").unwrap();
        assert!(!regions.has_auto_increment().unwrap());
        for (_, column) in regions.columns().unwrap() {
            assert!(!column.is_nullable());
            assert!(!column.is_auto_increment());
        }
        assert_eq!(
            regions.primary_key().unwrap(),
            Some(vec!["region".to_string(), "code".to_string()])
        );
    }

    #[test]
    fn test_column_attributes() {
        let connection = connection();
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        let customers = schema.table("customers").unwrap();

        let email = customers.column("email").unwrap();
        assert_eq!(email.type_name(), "varchar");
        assert_eq!(email.length(), Some(120));
        assert!(!email.is_nullable());
        assert_eq!(email.default(), None);

        let balance = customers.column("balance").unwrap();
        assert_eq!((balance.length(), balance.precision()), (Some(10), Some(2)));
        assert_eq!(balance.semantic_type(), SemanticType::Decimal);
        assert_eq!(balance.default_value().unwrap(), json!(0));

        let status = customers.column("status").unwrap();
        assert_eq!(status.semantic_type(), SemanticType::Text);
        assert_eq!(status.default_value().unwrap(), json!("active"));

        let created_at = customers.column("created_at").unwrap();
        assert_eq!(created_at.semantic_type(), SemanticType::Datetime);
        assert_eq!(created_at.default(), Some("CURRENT_TIMESTAMP"));
        assert!(created_at.default_value().unwrap().is_string());

        let flags = customers.column("flags").unwrap();
        assert!(flags.is_unsigned());
        assert_eq!(flags.type_name(), "int");
        assert_eq!(flags.length(), Some(4));
        assert_eq!(flags.default(), None);
    }

    #[test]
    fn test_indexes() {
        let connection = connection();
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();

        // Constraint indexes are internal to SQLite.
        let customers = schema.table("customers").unwrap();
        assert_eq!(customers.index_names().unwrap(), vec!["primary"]);

        let orders = schema.table("orders").unwrap();
        let mut names = orders.index_names().unwrap();
        assert_eq!(names.remove(0), "primary");
        names.sort();
        assert_eq!(names, vec!["orders_customer", "orders_region_code"]);

        let region_code = orders.index("orders_region_code").unwrap();
        assert_eq!(region_code.columns(), ["region", "code"]);
        assert!(!region_code.is_unique());

        let customer = orders.index("orders_customer").unwrap();
        assert_eq!(customer.columns(), ["customer_id", "id"]);
        assert!(customer.is_unique());
        assert!(!customer.is_primary());
    }

    #[test]
    fn test_foreign_keys() {
        let connection = connection();
        let schema = SchemaRegistry::new().use_schema(&connection).unwrap();
        let orders = schema.table("orders").unwrap();

        let mut names = orders.foreign_key_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["orders_customer_id", "orders_region_code"]);

        let region = orders.foreign_key("orders_region_code").unwrap();
        assert_eq!(region.referenced_table(), "regions");
        assert_eq!(
            region.column_pairs().collect::<Vec<_>>(),
            vec![("region", "region"), ("code", "code")]
        );
        assert_eq!(region.on_update(), ReferentialAction::SetNull);
        assert_eq!(region.on_delete(), ReferentialAction::NoAction);

        let customer = orders.foreign_key("orders_customer_id").unwrap();
        assert_eq!(customer.on_delete(), ReferentialAction::Cascade);

        // No column list: the parent's primary key is referenced.
        let notes = schema.table("notes").unwrap();
        let author = notes.foreign_key("notes_author_id").unwrap();
        assert_eq!(author.referenced_table(), "customers");
        assert_eq!(author.referenced_columns(), ["id"]);
    }

    #[test]
    fn test_cached_metadata_until_cleared() {
        let connection = SqliteConnection::open_in_memory().unwrap();
        connection.execute_batch(DDL).unwrap();
        let connection = Arc::new(connection);
        let shared: Arc<dyn Connection> = connection.clone();

        let cache = Arc::new(MemoryCache::new());
        let store: Arc<dyn CacheStore> = cache.clone();
        let registry = SchemaRegistry::new();
        registry.set_cache(Some(store));

        let schema = registry.use_schema(&shared).unwrap();
        let customers = schema.table("customers").unwrap();
        assert_eq!(customers.column_names().unwrap().len(), 6);
        assert!(cache.contains("_memory_.tables"));
        assert!(cache.contains("_memory_.customers.columns"));
        assert!(!cache.contains("_memory_.customers.indexes"));

        connection
            .execute_batch("ALTER TABLE customers ADD COLUMN nickname TEXT")
            .unwrap();

        // A second schema over the same cache sees the stored directory.
        let other = registry.build(&shared).unwrap();
        assert_eq!(other.table("customers").unwrap().column_names().unwrap().len(), 6);

        customers.clear();
        assert!(!cache.contains("_memory_.customers.columns"));
        let names = customers.column_names().unwrap();
        assert_eq!(names.len(), 7);
        assert_eq!(names.last().map(String::as_str), Some("nickname"));
    }
}
