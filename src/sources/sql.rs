// src/sources/sql.rs
// Relational backend: runs generated query text as-is

use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use crate::error::{QueryError, Result};
use crate::pipeline::ResultRows;
use crate::utils::truncate;

/// Executes query text against the analytics database
#[derive(Clone)]
pub struct SqlSource {
    pool: SqlitePool,
}

impl SqlSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run `query` and return every row as a JSON object keyed by column.
    /// Any backend error is an execution failure; nothing is retried.
    pub async fn run(&self, query: &str) -> Result<ResultRows> {
        debug!(query = %truncate(query, 200), "Executing generated SQL");
        let rows = sqlx::query(query).fetch_all(&self.pool).await.map_err(|e| {
            warn!(error = %e, "Generated SQL failed");
            QueryError::Execution(e.to_string())
        })?;
        Ok(ResultRows::new(rows.iter().map(row_to_json).collect()))
    }
}

fn row_to_json(row: &SqliteRow) -> Value {
    let mut map = Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), cell_to_json(row, idx));
    }
    Value::Object(map)
}

/// Decode one cell by its runtime storage class
fn cell_to_json(row: &SqliteRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(idx).map(Value::from).unwrap_or(Value::Null),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(idx).map(Value::from).unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|b| Value::String(String::from_utf8_lossy(&b).into_owned()))
            .unwrap_or(Value::Null),
        _ => row.try_get::<String, _>(idx).map(Value::String).unwrap_or(Value::Null),
    }
}
