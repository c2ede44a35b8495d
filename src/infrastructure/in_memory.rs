use crate::domain::ports::RecordStore;
use crate::domain::record::{Method, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type RecordKey = (String, Method);

/// A thread-safe in-memory store for transaction records.
///
/// Uses `Arc<RwLock<..>>` for shared concurrent access. Every saved record is
/// kept; lookups return the most recent one per `(token, method)`.
/// Ideal for testing or single-process runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordKey, Vec<TransactionRecord>>>>,
}

impl InMemoryRecordStore {
    /// Creates a new, empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn save(&self, record: TransactionRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry((record.token().to_string(), record.method()))
            .or_default()
            .push(record);
        Ok(())
    }

    async fn find(&self, token: &str, method: Method) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(token.to_string(), method))
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn history(&self, token: &str) -> Result<Vec<TransactionRecord>> {
        let records = self.records.read().await;
        let mut history: Vec<TransactionRecord> = records
            .iter()
            .filter(|((key_token, _), _)| key_token == token)
            .flat_map(|(_, versions)| versions.iter().cloned())
            .collect();
        history.sort_by_key(TransactionRecord::created_at);
        Ok(history)
    }
}
