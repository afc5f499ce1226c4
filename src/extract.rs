//! Schema extraction: introspection queries against an injected query
//! capability, assembled into a SchemaDef. Any query failure aborts the
//! whole extraction; partial schemas are never returned.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::schema::{Column, ForeignKey, SchemaDef, Table};

/// One result row: column name to scalar value.
pub type Row = HashMap<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("query failed: {0}")]
    Query(String),
    #[error("malformed row from {query}: missing {field}")]
    MalformedRow { query: &'static str, field: &'static str },
}

/// Query-execution capability. The engine only issues the three
/// introspection shapes below; timeouts and cancellation are the caller's
/// concern.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, ExtractError>;
}

const LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Introspect the database behind `executor` into a fresh SchemaDef.
pub async fn extract_schema(executor: &dyn QueryExecutor) -> Result<SchemaDef, ExtractError> {
    let mut tables = Vec::new();
    let mut foreign_keys = Vec::new();

    for row in executor.execute(LIST_TABLES).await? {
        let name = string_field(&row, "name").ok_or(ExtractError::MalformedRow {
            query: "table list",
            field: "name",
        })?;

        let columns = extract_columns(executor, &name).await?;
        foreign_keys.extend(extract_foreign_keys(executor, &name).await?);
        tables.push(Table { name, columns });
    }

    debug!(tables = tables.len(), foreign_keys = foreign_keys.len(), "schema extracted");
    Ok(SchemaDef { tables, foreign_keys })
}

async fn extract_columns(
    executor: &dyn QueryExecutor,
    table: &str,
) -> Result<Vec<Column>, ExtractError> {
    let sql = format!("PRAGMA table_info(\"{}\")", table);
    let mut columns = Vec::new();

    for row in executor.execute(&sql).await? {
        let name = string_field(&row, "name").ok_or(ExtractError::MalformedRow {
            query: "table_info",
            field: "name",
        })?;
        let col_type = string_field(&row, "type")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "TEXT".to_string());

        columns.push(Column {
            name,
            col_type,
            not_null: truthy(row.get("notnull")),
            is_primary_key: truthy(row.get("pk")),
            default_value: string_field(&row, "dflt_value"),
        });
    }

    Ok(columns)
}

async fn extract_foreign_keys(
    executor: &dyn QueryExecutor,
    table: &str,
) -> Result<Vec<ForeignKey>, ExtractError> {
    let sql = format!("PRAGMA foreign_key_list(\"{}\")", table);
    let mut keys = Vec::new();

    for row in executor.execute(&sql).await? {
        // Rows missing any key field are skipped, not fatal.
        let (Some(to_table), Some(from_column), Some(to_column)) = (
            string_field(&row, "table"),
            string_field(&row, "from"),
            string_field(&row, "to"),
        ) else {
            continue;
        };

        keys.push(ForeignKey {
            from_table: table.to_string(),
            from_column,
            to_table,
            to_column,
        });
    }

    Ok(keys)
}

fn string_field(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0 || n.as_f64().unwrap_or(0.0) != 0.0,
        _ => false,
    }
}
