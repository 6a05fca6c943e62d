use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{IndexName, RecordStore, RecordType, StoredRecord, StoreError};

/// Process-local record store. Used by tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<(RecordType, String), StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert((record_type, record.key.clone()), record);
        Ok(())
    }

    async fn get(&self, record_type: RecordType, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(record_type, key.to_string()))
            .map(|r| r.data.clone()))
    }

    async fn get_all(&self, record_type: RecordType) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|((t, _), _)| *t == record_type)
            .map(|(_, r)| r.data.clone())
            .collect())
    }

    async fn get_all_by_index(
        &self,
        record_type: RecordType,
        index: IndexName,
        value: &str,
    ) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|((t, _), r)| {
                *t == record_type
                    && r.indexes.iter().any(|(name, v)| *name == index && v == value)
            })
            .map(|(_, r)| r.data.clone())
            .collect())
    }

    async fn delete(&self, record_type: RecordType, key: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .remove(&(record_type, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, status: &str) -> StoredRecord {
        StoredRecord {
            key: key.to_string(),
            indexes: vec![(IndexName::ByStatus, status.to_string())],
            data: json!({"key": key, "status": status}),
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryRecordStore::new();
        assert!(store.get(RecordType::Searches, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_types_are_isolated() {
        let store = MemoryRecordStore::new();
        store.put(RecordType::Searches, record("k", "active")).await.unwrap();

        assert!(store.get(RecordType::Candidates, "k").await.unwrap().is_none());
        assert_eq!(store.get_all(RecordType::Searches).await.unwrap().len(), 1);
        assert!(store.get_all(RecordType::Candidates).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_lookup_and_delete() {
        let store = MemoryRecordStore::new();
        store.put(RecordType::Searches, record("a", "active")).await.unwrap();
        store.put(RecordType::Searches, record("b", "archived")).await.unwrap();
        store.put(RecordType::Searches, record("c", "active")).await.unwrap();

        let active = store
            .get_all_by_index(RecordType::Searches, IndexName::ByStatus, "active")
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        store.delete(RecordType::Searches, "a").await.unwrap();
        store.delete(RecordType::Searches, "a").await.unwrap();
        let active = store
            .get_all_by_index(RecordType::Searches, IndexName::ByStatus, "active")
            .await
            .unwrap();
        assert_eq!(active, vec![json!({"key": "c", "status": "active"})]);
    }
}
