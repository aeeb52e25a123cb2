//! RAG dataset: a named, versioned logical corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::record::{new_id, Record, RecordType};

/// One version of a logical document corpus.
///
/// Several datasets may share a `name`; they differ by `version` and always
/// by `id`. Datasets are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagDataset {
    /// Unique identifier (ULID)
    pub id: String,
    /// Human label, shared across versions
    pub name: String,
    /// Tag of the source content (e.g. "v1.0")
    pub version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl RagDataset {
    /// Build a new dataset with a fresh id.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, LifecycleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LifecycleError::InvalidInput(
                "dataset name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: new_id(),
            name,
            version: version.into(),
            created_at: Utc::now(),
        })
    }
}

impl Record for RagDataset {
    const RECORD_TYPE: RecordType = RecordType::Dataset;

    fn id(&self) -> &str {
        &self.id
    }
}
