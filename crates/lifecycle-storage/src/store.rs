//! The metadata store contract.
//!
//! Records travel as JSON objects; the `id` field is the key within a record
//! type. Writes are upserts with last-write-wins semantics and there is no
//! multi-record transaction.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`put`](MetadataStore::put) | Insert or overwrite a record by id |
//! | [`get`](MetadataStore::get) | Fetch one record by id |
//! | [`query`](MetadataStore::query) | Filtered, ordered, limited scan |

use async_trait::async_trait;
use lifecycle_types::{Record, RecordType};
use serde_json::Value;

use crate::error::StorageError;
use crate::query::RecordQuery;

/// A record as the store sees it: a JSON object with a string `id`.
pub type StoredRecord = Value;

/// Abstract metadata store.
///
/// Implementations must be `Send + Sync`; each call is independent and may be
/// retried by the caller when it is a read.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist or overwrite a record, keyed by its `id` field.
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StorageError>;

    /// Fetch a record by id.
    async fn get(
        &self,
        record_type: RecordType,
        id: &str,
    ) -> Result<Option<StoredRecord>, StorageError>;

    /// Return matching records, ordered and limited as requested.
    async fn query(
        &self,
        record_type: RecordType,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, StorageError>;
}

/// Extract the key of a stored record.
pub fn record_id(record_type: RecordType, record: &StoredRecord) -> Result<&str, StorageError> {
    record
        .get("id")
        .and_then(Value::as_str)
        .ok_or(StorageError::MissingId(record_type))
}

/// Serialize a typed entity for storage.
pub fn encode<R: Record>(record: &R) -> Result<StoredRecord, StorageError> {
    Ok(serde_json::to_value(record)?)
}

/// Deserialize a stored record into a typed entity.
pub fn decode<R: Record>(record: StoredRecord) -> Result<R, StorageError> {
    Ok(serde_json::from_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_types::RagDataset;
    use serde_json::json;

    #[test]
    fn test_record_id() {
        let record = json!({"id": "abc", "name": "Wiki"});
        assert_eq!(record_id(RecordType::Dataset, &record).unwrap(), "abc");
    }

    #[test]
    fn test_record_id_missing() {
        let record = json!({"name": "Wiki"});
        assert!(matches!(
            record_id(RecordType::Dataset, &record),
            Err(StorageError::MissingId(RecordType::Dataset))
        ));
    }

    #[test]
    fn test_encode_decode() {
        let dataset = RagDataset::new("Wiki", "v1.0").unwrap();
        let stored = encode(&dataset).unwrap();
        assert_eq!(stored["name"], "Wiki");
        let decoded: RagDataset = decode(stored).unwrap();
        assert_eq!(decoded, dataset);
    }
}
