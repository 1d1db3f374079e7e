// src/db.rs
// SQLite pool setup and query-record schema

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS queries (
    id TEXT PRIMARY KEY NOT NULL,
    question TEXT NOT NULL,
    response TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_queries_created_at ON queries(created_at);
"#;

/// Open a SQLite pool. In-memory URLs get a single connection so every
/// query sees the same database.
pub async fn create_pool(database_url: &str, read_only: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .read_only(read_only)
        .create_if_missing(!read_only);

    let in_memory = database_url.contains(":memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 10 })
        .acquire_timeout(Duration::from_secs(10))
        // An in-memory database lives only as long as its connection
        .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
        .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
        .connect_with(options)
        .await?;

    debug!(database_url, read_only, "SQLite pool ready");
    Ok(pool)
}

/// Create the query-record table if it does not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("Query store schema ready");
    Ok(())
}
