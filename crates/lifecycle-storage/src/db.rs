//! RocksDB-backed metadata store.
//!
//! Provides:
//! - Database open with one column family per record type
//! - JSON values keyed by record id (upsert, last write wins)
//! - Full-scan queries evaluated with [`RecordQuery::apply`]
//!
//! RocksDB calls block, so every operation runs on the blocking pool; an
//! async caller can then bound it with a deadline.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lifecycle_types::RecordType;
use rocksdb::{ColumnFamily, IteratorMode, Options, DB};
use tracing::{debug, info};

use crate::column_families::{build_cf_descriptors, cf_for, ALL_CF_NAMES};
use crate::error::StorageError;
use crate::query::RecordQuery;
use crate::store::{record_id, MetadataStore, StoredRecord};

/// Persistent metadata store.
///
/// Cloning is cheap: clones share the same underlying database handle.
#[derive(Clone)]
pub struct RocksMetadataStore {
    db: Arc<DB>,
}

impl RocksMetadataStore {
    /// Open storage at the given path, creating it if necessary.
    /// Missing column families are created.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening metadata store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush all column families to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(cf)?;
            }
        }
        Ok(())
    }

    /// Count records per type and measure disk usage.
    ///
    /// Counting scans every column family; intended for admin tooling.
    pub fn get_stats(&self) -> Result<MetadataStats, StorageError> {
        Ok(MetadataStats {
            dataset_count: count_entries(&self.db, RecordType::Dataset)?,
            embedding_config_count: count_entries(&self.db, RecordType::EmbeddingConfig)?,
            index_generation_count: count_entries(&self.db, RecordType::IndexGeneration)?,
            disk_usage_bytes: disk_usage(&self.db),
        })
    }
}

/// Column family for a record type.
fn cf_handle(db: &DB, record_type: RecordType) -> Result<&ColumnFamily, StorageError> {
    let name = cf_for(record_type);
    db.cf_handle(name)
        .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
}

/// Number of records stored under a type.
fn count_entries(db: &DB, record_type: RecordType) -> Result<u64, StorageError> {
    let cf = cf_handle(db, record_type)?;
    let mut count = 0u64;
    for item in db.iterator_cf(cf, IteratorMode::Start) {
        item?;
        count += 1;
    }
    Ok(count)
}

/// Sum of file sizes in the database directory, 0 if it cannot be read.
fn disk_usage(db: &DB) -> u64 {
    std::fs::read_dir(db.path())
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|entry| entry.metadata().ok())
                .map(|metadata| metadata.len())
                .sum()
        })
        .unwrap_or(0)
}

#[async_trait]
impl MetadataStore for RocksMetadataStore {
    /// Upsert keyed by the record's `id`.
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StorageError> {
        let id = record_id(record_type, &record)?.to_string();
        let bytes = serde_json::to_vec(&record)?;
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let cf = cf_handle(&db, record_type)?;
            db.put_cf(cf, id.as_bytes(), bytes)?;
            debug!(record_type = %record_type, id = %id, "Stored record");
            Ok(())
        })
        .await?
    }

    /// Point lookup by id.
    async fn get(
        &self,
        record_type: RecordType,
        id: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let id = id.to_string();
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<Option<StoredRecord>, StorageError> {
            let cf = cf_handle(&db, record_type)?;
            match db.get_cf(cf, id.as_bytes())? {
                Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                None => Ok(None),
            }
        })
        .await?
    }

    /// Scan the column family and evaluate `query` over every record.
    async fn query(
        &self,
        record_type: RecordType,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let query = query.clone();
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<Vec<StoredRecord>, StorageError> {
            let cf = cf_handle(&db, record_type)?;
            let mut scanned = Vec::new();
            for item in db.iterator_cf(cf, IteratorMode::Start) {
                let (_, value) = item?;
                scanned.push(serde_json::from_slice::<StoredRecord>(&value)?);
            }
            let results = query.apply(scanned);
            debug!(
                record_type = %record_type,
                query = %query,
                matched = results.len(),
                "Queried records"
            );
            Ok(results)
        })
        .await?
    }
}

/// Statistics about the metadata store.
#[derive(Debug, Default)]
pub struct MetadataStats {
    /// Stored datasets
    pub dataset_count: u64,
    /// Stored embedding configs
    pub embedding_config_count: u64,
    /// Stored index generations
    pub index_generation_count: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}
