//! Column family definitions for RocksDB.
//!
//! One column family per record type, keyed by record id:
//! - datasets: RAG dataset versions (written once)
//! - embedding_configs: embedding strategies (written once)
//! - index_generations: generations, rewritten on every status change

use lifecycle_types::RecordType;
use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for datasets
pub const CF_DATASETS: &str = "datasets";

/// Column family name for embedding configs
pub const CF_EMBEDDING_CONFIGS: &str = "embedding_configs";

/// Column family name for index generations
pub const CF_INDEX_GENERATIONS: &str = "index_generations";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_DATASETS, CF_EMBEDDING_CONFIGS, CF_INDEX_GENERATIONS];

/// Column family backing a record type.
pub fn cf_for(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Dataset => CF_DATASETS,
        RecordType::EmbeddingConfig => CF_EMBEDDING_CONFIGS,
        RecordType::IndexGeneration => CF_INDEX_GENERATIONS,
    }
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_DATASETS, Options::default()),
        ColumnFamilyDescriptor::new(CF_EMBEDDING_CONFIGS, Options::default()),
        ColumnFamilyDescriptor::new(CF_INDEX_GENERATIONS, Options::default()),
    ]
}
