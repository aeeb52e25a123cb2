//! Metadata store adapter for index lifecycle records.
//!
//! Provides:
//! - The [`MetadataStore`] contract: put/get/query over JSON records
//! - Backend-neutral [`RecordQuery`] filters with sort and limit
//! - A RocksDB backend with one column family per record type
//! - An in-memory backend for tests and embedding

pub mod column_families;
pub mod db;
pub mod error;
pub mod memory;
pub mod query;
pub mod store;

pub use db::{MetadataStats, RocksMetadataStore};
pub use error::StorageError;
pub use memory::InMemoryMetadataStore;
pub use query::{Filter, RecordQuery, SortKey, SortOrder};
pub use store::{decode, encode, record_id, MetadataStore, StoredRecord};
