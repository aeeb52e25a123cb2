//! In-memory [`MetadataStore`] for tests and embedding in other processes.
//!
//! Records live in a `BTreeMap` per record type behind a `RwLock`, so scans
//! come back in id order just like the RocksDB backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use lifecycle_types::RecordType;

use crate::error::StorageError;
use crate::query::RecordQuery;
use crate::store::{record_id, MetadataStore, StoredRecord};

type Collections = HashMap<RecordType, BTreeMap<String, StoredRecord>>;

/// In-memory metadata store.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    collections: RwLock<Collections>,
}

impl InMemoryMetadataStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored under a type.
    pub fn len(&self, record_type: RecordType) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&record_type).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// True when no record of any type is stored.
    pub fn is_empty(&self) -> bool {
        RecordType::ALL.iter().all(|t| self.len(*t) == 0)
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StorageError> {
        let id = record_id(record_type, &record)?.to_string();
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections.entry(record_type).or_default().insert(id, record);
        Ok(())
    }

    async fn get(
        &self,
        record_type: RecordType,
        id: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(&record_type)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn query(
        &self,
        record_type: RecordType,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let collections = self.collections.read().map_err(poisoned)?;
        let scanned = collections
            .get(&record_type)
            .map(|records| records.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(scanned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let store = InMemoryMetadataStore::new();
        assert!(store.is_empty());

        store
            .put(RecordType::IndexGeneration, json!({"id": "g1", "status": "draft"}))
            .await
            .unwrap();
        store
            .put(RecordType::IndexGeneration, json!({"id": "g1", "status": "staging"}))
            .await
            .unwrap();

        let loaded = store
            .get(RecordType::IndexGeneration, "g1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded["status"], "staging");
        assert_eq!(store.len(RecordType::IndexGeneration), 1);
    }

    #[tokio::test]
    async fn test_query_returns_id_order() {
        let store = InMemoryMetadataStore::new();
        for id in ["c", "a", "b"] {
            store
                .put(RecordType::Dataset, json!({"id": id, "name": "Wiki"}))
                .await
                .unwrap();
        }

        let results = store
            .query(RecordType::Dataset, &RecordQuery::new(Filter::eq("name", "Wiki")))
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let store = InMemoryMetadataStore::new();
        let results = store
            .query(RecordType::EmbeddingConfig, &RecordQuery::all())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
