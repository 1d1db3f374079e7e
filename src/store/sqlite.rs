// src/store/sqlite.rs
// SQLite-backed query store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::{QueryRecord, QueryStore};
use crate::error::{QueryError, Result};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap a pool whose schema is already initialized
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = crate::db::create_pool(database_url, false).await?;
        crate::db::init_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

/// Fixed-width RFC 3339 so text order matches time order
fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_row((id, question, response, created_at): (String, String, String, String)) -> Result<QueryRecord> {
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| QueryError::Db(sqlx::Error::Decode(Box::new(e))))?
        .with_timezone(&Utc);
    Ok(QueryRecord {
        id,
        question,
        response,
        created_at,
    })
}

#[async_trait]
impl QueryStore for SqliteStore {
    async fn create(&self, question: &str, response: &str) -> Result<QueryRecord> {
        let record = QueryRecord::new(question, response);
        sqlx::query("INSERT INTO queries (id, question, response, created_at) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.question)
            .bind(&record.response)
            .bind(encode_time(&record.created_at))
            .execute(&self.pool)
            .await?;
        debug!(id = %record.id, "Query record stored");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QueryRecord>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, question, response, created_at FROM queries ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<QueryRecord>> {
        let row: Option<(String, String, String, String)> =
            sqlx::query_as("SELECT id, question, response, created_at FROM queries WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(decode_row).transpose()
    }
}
