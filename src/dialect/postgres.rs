//! PostgreSQL catalog reader.
//!
//! Reads `information_schema` joined with `pg_catalog`. Tables are scoped to
//! the configured namespace (`public` by default).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::helpers::{
    group_foreign_keys, group_indexes, lookup_type, required_str, ForeignKeyRow, IndexRow,
};
use super::{Dialect, ReadContext, SchemaReader};
use crate::connection::{ConnectionError, Row};
use crate::model::{
    is_numeric, ColumnData, Directory, ForeignKeyData, IndexData, ReferentialAction, SemanticType,
    TableData,
};

static NULL_DEFAULT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:nextval|NULL::)").unwrap());
static CAST_DEFAULT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^('.*')(?:::.*)$").unwrap());

/// Verbose `information_schema` type names and their short forms.
const TYPE_NAMES: &[(&str, &str)] = &[
    ("character varying", "varchar"),
    ("character", "char"),
    ("time without time zone", "time"),
    ("time with time zone", "timetz"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
];

const TYPES: &[(&str, SemanticType)] = &[
    ("bigint", SemanticType::Integer),
    ("boolean", SemanticType::Boolean),
    ("bytea", SemanticType::Binary),
    ("date", SemanticType::Date),
    ("double precision", SemanticType::Float),
    ("integer", SemanticType::Integer),
    ("json", SemanticType::Json),
    ("jsonb", SemanticType::Json),
    ("numeric", SemanticType::Decimal),
    ("real", SemanticType::Float),
    ("smallint", SemanticType::Integer),
    ("text", SemanticType::Text),
    ("time", SemanticType::Time),
    ("timetz", SemanticType::Time),
    ("timestamp", SemanticType::DatetimeFractional),
    ("timestamptz", SemanticType::DatetimeTimezone),
];

pub(crate) const TABLES_SQL: &str = "SELECT t.table_name AS name, \
    obj_description(c.oid, 'pg_class') AS comment \
    FROM information_schema.tables AS t \
    INNER JOIN pg_catalog.pg_namespace AS n ON n.nspname = t.table_schema \
    INNER JOIN pg_catalog.pg_class AS c ON c.relnamespace = n.oid AND c.relname = t.table_name \
    WHERE t.table_catalog = $1 AND t.table_schema = $2 AND t.table_type = 'BASE TABLE' \
    ORDER BY t.table_name ASC";

pub(crate) const COLUMNS_SQL: &str = "SELECT col.column_name AS name, col.data_type AS type, \
    col.character_maximum_length AS char_length, col.numeric_precision AS num_precision, \
    col.numeric_scale AS num_scale, col.datetime_precision AS datetime_precision, \
    col.is_nullable AS nullable, col.column_default AS col_default, d.description AS comment, \
    pg_get_serial_sequence(quote_ident(col.table_schema) || '.' || quote_ident(col.table_name), col.column_name) \
    IS NOT NULL AS auto_increment \
    FROM information_schema.columns AS col \
    INNER JOIN pg_catalog.pg_namespace AS n ON n.nspname = col.table_schema \
    INNER JOIN pg_catalog.pg_class AS c ON c.relnamespace = n.oid AND c.relname = col.table_name \
    LEFT JOIN pg_catalog.pg_description AS d ON d.objoid = c.oid AND d.objsubid = col.ordinal_position \
    WHERE col.table_catalog = $1 AND col.table_schema = $2 AND col.table_name = $3 \
    ORDER BY col.ordinal_position ASC";

pub(crate) const INDEXES_SQL: &str = "SELECT ic.relname AS name, a.attname AS column_name, \
    i.indisunique AS is_unique, i.indisprimary AS is_primary, am.amname AS type, \
    array_position(i.indkey::int2[], a.attnum) AS seq \
    FROM pg_catalog.pg_namespace AS n \
    INNER JOIN pg_catalog.pg_class AS c ON c.relnamespace = n.oid \
    INNER JOIN pg_catalog.pg_index AS i ON i.indrelid = c.oid \
    INNER JOIN pg_catalog.pg_class AS ic ON ic.oid = i.indexrelid \
    INNER JOIN pg_catalog.pg_am AS am ON am.oid = ic.relam \
    INNER JOIN pg_catalog.pg_attribute AS a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey) \
    WHERE n.nspname = $1 AND c.relname = $2 \
    ORDER BY i.indisprimary DESC, i.indisunique DESC, ic.relname ASC, seq ASC";

pub(crate) const FOREIGN_KEYS_SQL: &str = "SELECT con.conname AS name, a.attname AS column_name, \
    rc.relname AS ref_table_name, ra.attname AS ref_column, k.ord AS seq, \
    con.confupdtype AS on_update, con.confdeltype AS on_delete \
    FROM pg_catalog.pg_namespace AS n \
    INNER JOIN pg_catalog.pg_class AS c ON c.relnamespace = n.oid \
    INNER JOIN pg_catalog.pg_constraint AS con ON con.conrelid = c.oid AND con.contype = 'f' \
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, ref_attnum, ord) \
    INNER JOIN pg_catalog.pg_attribute AS a ON a.attrelid = c.oid AND a.attnum = k.attnum \
    INNER JOIN pg_catalog.pg_class AS rc ON rc.oid = con.confrelid \
    INNER JOIN pg_catalog.pg_attribute AS ra ON ra.attrelid = con.confrelid AND ra.attnum = k.ref_attnum \
    WHERE n.nspname = $1 AND c.relname = $2 \
    ORDER BY con.conname ASC, k.ord ASC";

/// Reader for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresReader;

impl PostgresReader {
    /// Decode one `information_schema.columns` row.
    pub fn parse_column(row: &Row) -> Result<(String, ColumnData), ConnectionError> {
        let name = required_str(row, "name")?;
        let raw_type = required_str(row, "type")?.to_lowercase();
        let type_name = TYPE_NAMES
            .iter()
            .find(|(verbose, _)| *verbose == raw_type)
            .map(|(_, short)| short.to_string())
            .unwrap_or(raw_type);

        let mut column = ColumnData::new(type_name);

        match column.type_name.as_str() {
            "date" | "time" | "timetz" | "timestamp" | "timestamptz" => {
                column.precision = row.get_u32("datetime_precision");
            }
            "bigint" | "bigserial" | "double precision" | "integer" | "numeric" | "serial"
            | "smallint" | "real" => {
                column.length = row.get_u32("num_precision");
                column.precision = row.get_u32("num_scale");
            }
            _ => {
                column.length = row.get_u32("char_length");
            }
        }

        column.nullable = row.get_str("nullable").as_deref() == Some("YES");
        column.default = row.get_str("col_default").map(|raw| normalize_default(&raw));
        column.comment = Some(row.get_str("comment").unwrap_or_default());
        column.auto_increment = row.get_bool("auto_increment");

        Ok((name, column))
    }
}

/// Sequence calls and typed NULLs become `NULL`; cast suffixes are dropped
/// from quoted literals.
fn normalize_default(raw: &str) -> String {
    if is_numeric(raw) {
        return raw.to_string();
    }
    if NULL_DEFAULT.is_match(raw) {
        return "NULL".to_string();
    }
    match CAST_DEFAULT.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    }
}

/// `pg_constraint` action codes.
fn action(code: Option<String>) -> ReferentialAction {
    match code.as_deref() {
        Some("c") => ReferentialAction::Cascade,
        Some("r") => ReferentialAction::Restrict,
        Some("n") => ReferentialAction::SetNull,
        Some("d") => ReferentialAction::SetDefault,
        _ => ReferentialAction::NoAction,
    }
}

impl SchemaReader for PostgresReader {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(database = ctx.database))]
    fn read_tables(&self, ctx: &ReadContext<'_>) -> Result<Directory<TableData>, ConnectionError> {
        let rows = ctx.query(
            TABLES_SQL,
            &[Value::from(ctx.database), Value::from(ctx.namespace)],
        )?;

        rows.iter()
            .map(|row| {
                let data = TableData {
                    comment: Some(row.get_str("comment").unwrap_or_default()),
                    ..TableData::default()
                };
                Ok((required_str(row, "name")?, data))
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_columns(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ColumnData>, ConnectionError> {
        let rows = ctx.query(
            COLUMNS_SQL,
            &[
                Value::from(ctx.database),
                Value::from(ctx.namespace),
                Value::from(table),
            ],
        )?;
        rows.iter().map(Self::parse_column).collect()
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_indexes(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<IndexData>, ConnectionError> {
        let rows = ctx.query(INDEXES_SQL, &[Value::from(ctx.namespace), Value::from(table)])?;

        let rows = rows
            .iter()
            .map(|row| {
                Ok(IndexRow {
                    name: required_str(row, "name")?,
                    column: required_str(row, "column_name")?,
                    unique: row.get_bool("is_unique"),
                    primary: row.get_bool("is_primary"),
                    seq: row.get_i64("seq").unwrap_or_default(),
                    index_type: row.get_str("type"),
                })
            })
            .collect::<Result<Vec<_>, ConnectionError>>()?;

        Ok(group_indexes(rows))
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_foreign_keys(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ForeignKeyData>, ConnectionError> {
        let rows = ctx.query(FOREIGN_KEYS_SQL, &[Value::from(ctx.namespace), Value::from(table)])?;

        let rows = rows
            .iter()
            .map(|row| {
                Ok(ForeignKeyRow {
                    name: required_str(row, "name")?,
                    column: required_str(row, "column_name")?,
                    referenced_table: required_str(row, "ref_table_name")?,
                    referenced_column: required_str(row, "ref_column")?,
                    seq: row.get_i64("seq").unwrap_or_default(),
                    on_update: action(row.get_str("on_update")),
                    on_delete: action(row.get_str("on_delete")),
                })
            })
            .collect::<Result<Vec<_>, ConnectionError>>()?;

        Ok(group_foreign_keys(rows))
    }

    fn semantic_type(&self, column: &ColumnData) -> SemanticType {
        lookup_type(TYPES, &column.type_name)
    }
}
