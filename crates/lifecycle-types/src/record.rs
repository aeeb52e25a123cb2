//! Persisted record types.
//!
//! Each entity maps 1:1 to a record type in the metadata store. Records are
//! stored as JSON objects keyed by their `id`; references between records are
//! plain foreign-key fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The three kinds of records the metadata store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Dataset,
    EmbeddingConfig,
    IndexGeneration,
}

impl RecordType {
    /// Every record type, one column family each.
    pub const ALL: [RecordType; 3] = [
        RecordType::Dataset,
        RecordType::EmbeddingConfig,
        RecordType::IndexGeneration,
    ];

    /// Collection name used by storage backends.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordType::Dataset => "datasets",
            RecordType::EmbeddingConfig => "embedding_configs",
            RecordType::IndexGeneration => "index_generations",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::Dataset => write!(f, "dataset"),
            RecordType::EmbeddingConfig => write!(f, "embedding config"),
            RecordType::IndexGeneration => write!(f, "index generation"),
        }
    }
}

/// An entity that can be persisted in the metadata store.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Record type this entity is stored under.
    const RECORD_TYPE: RecordType;

    /// Stable identifier, unique within the record type.
    fn id(&self) -> &str;
}

/// Generate a fresh entity identifier.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            RecordType::ALL.iter().map(|t| t.collection()).collect();
        assert_eq!(names.len(), RecordType::ALL.len());
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
    }
}
