// src/store/mod.rs
// Append-only storage for answered questions

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A persisted question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub id: String,
    pub question: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl QueryRecord {
    /// Fresh record with a generated id and the current time, kept to
    /// microseconds so every store returns it unchanged
    pub fn new(question: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            question: question.into(),
            response: response.into(),
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Records are created once and never updated or deleted.
/// Callers always get copies.
#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn create(&self, question: &str, response: &str) -> Result<QueryRecord>;

    /// All records, newest first
    async fn list(&self) -> Result<Vec<QueryRecord>>;

    async fn get(&self, id: &str) -> Result<Option<QueryRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = QueryRecord::new("What are our top products?", "Widgets");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["question"], "What are our top products?");
        assert_eq!(record.id.len(), 36);
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let a = QueryRecord::new("q", "r");
        let b = QueryRecord::new("q", "r");
        assert_ne!(a.id, b.id);
    }
}
