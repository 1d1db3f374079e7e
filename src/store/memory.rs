// src/store/memory.rs
// In-process query store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QueryRecord, QueryStore};
use crate::error::Result;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<QueryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueryStore for MemoryStore {
    async fn create(&self, question: &str, response: &str) -> Result<QueryRecord> {
        // Stamp under the lock so insertion order matches `created_at`
        let mut records = self.records.write().await;
        let record = QueryRecord::new(question, response);
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<QueryRecord>> {
        // Insertion order is creation order
        Ok(self.records.read().await.iter().rev().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<QueryRecord>> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        let created = store.create("Who are our best customers?", "Alice Johnson").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question, "Who are our best customers?");
        assert_eq!(listed[0].response, "Alice Johnson");
        assert_eq!(store.get(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_newest_first() {
        let store = MemoryStore::new();
        let first = store.create("first question", "a").await.unwrap();
        let second = store.create("second question", "b").await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert!(listed[0].created_at >= listed[1].created_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_stay_newest_first() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(&format!("question number {}", i), "answer").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 64);
        assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_get_unknown() {
        assert!(MemoryStore::new().get("missing").await.unwrap().is_none());
    }
}
