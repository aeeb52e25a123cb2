//! Embedding configuration: model plus chunking parameters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::record::{new_id, Record, RecordType};

/// Opaque vectorizer parameters, passed through to the embedding pipeline.
pub type VectorizerParameters = BTreeMap<String, serde_json::Value>;

/// A strategy for turning text into vectors.
///
/// `(model_name, chunk_size, chunk_overlap, vectorizer_parameters)` acts as a
/// natural key, but duplicates are allowed: each registration gets its own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Unique identifier (ULID)
    pub id: String,
    /// Embedding model name (e.g. "e5", "openai/text-embedding-3-small")
    pub model_name: String,
    /// Chunk size in tokens, always > 0
    pub chunk_size: u32,
    /// Overlap between consecutive chunks, always < chunk_size
    pub chunk_overlap: u32,
    /// Backend-specific vectorizer settings
    #[serde(default)]
    pub vectorizer_parameters: VectorizerParameters,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl EmbeddingConfig {
    /// Validate parameters and build a config with a fresh id.
    pub fn new(
        model_name: impl Into<String>,
        chunk_size: u32,
        chunk_overlap: u32,
        vectorizer_parameters: VectorizerParameters,
    ) -> Result<Self, LifecycleError> {
        let model_name = model_name.into();
        validate_chunking(&model_name, chunk_size, chunk_overlap)?;

        Ok(Self {
            id: new_id(),
            model_name,
            chunk_size,
            chunk_overlap,
            vectorizer_parameters,
            created_at: Utc::now(),
        })
    }

    /// Canonical string form of the natural key.
    ///
    /// Parameters are rendered from a `BTreeMap`, so key order is stable.
    pub fn natural_key(&self) -> String {
        let params = serde_json::to_string(&self.vectorizer_parameters).unwrap_or_default();
        format!(
            "{}|{}|{}|{}",
            self.model_name, self.chunk_size, self.chunk_overlap, params
        )
    }

    /// Whether two configs are logically interchangeable.
    pub fn is_equivalent(&self, other: &EmbeddingConfig) -> bool {
        self.model_name == other.model_name
            && self.chunk_size == other.chunk_size
            && self.chunk_overlap == other.chunk_overlap
            && self.vectorizer_parameters == other.vectorizer_parameters
    }
}

fn validate_chunking(
    model_name: &str,
    chunk_size: u32,
    chunk_overlap: u32,
) -> Result<(), LifecycleError> {
    if model_name.trim().is_empty() {
        return Err(LifecycleError::InvalidConfig(
            "model_name must not be empty".to_string(),
        ));
    }
    if chunk_size == 0 {
        return Err(LifecycleError::InvalidConfig(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(LifecycleError::InvalidConfig(format!(
            "chunk_overlap ({}) must be less than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}

impl Record for EmbeddingConfig {
    const RECORD_TYPE: RecordType = RecordType::EmbeddingConfig;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_config() {
        let config = EmbeddingConfig::new("e5", 512, 50, VectorizerParameters::new()).unwrap();
        assert_eq!(config.model_name, "e5");
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.chunk_overlap, 50);
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let result = EmbeddingConfig::new("m", 100, 100, VectorizerParameters::new());
        assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
    }

    #[test]
    fn test_overlap_greater_than_size_rejected() {
        let result = EmbeddingConfig::new("m", 100, 150, VectorizerParameters::new());
        assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = EmbeddingConfig::new("m", 0, 0, VectorizerParameters::new());
        assert!(matches!(result, Err(LifecycleError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_overlap_allowed() {
        assert!(EmbeddingConfig::new("m", 1, 0, VectorizerParameters::new()).is_ok());
    }

    #[test]
    fn test_duplicates_get_distinct_ids_but_are_equivalent() {
        let mut params = VectorizerParameters::new();
        params.insert("normalize".to_string(), json!(true));

        let a = EmbeddingConfig::new("e5", 512, 50, params.clone()).unwrap();
        let b = EmbeddingConfig::new("e5", 512, 50, params).unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.is_equivalent(&b));
        assert_eq!(a.natural_key(), b.natural_key());
    }

    #[test]
    fn test_natural_key_reflects_parameters() {
        let mut params = VectorizerParameters::new();
        params.insert("dims".to_string(), json!(384));

        let plain = EmbeddingConfig::new("e5", 512, 50, VectorizerParameters::new()).unwrap();
        let tuned = EmbeddingConfig::new("e5", 512, 50, params).unwrap();

        assert!(!plain.is_equivalent(&tuned));
        assert_eq!(tuned.natural_key(), "e5|512|50|{\"dims\":384}");
    }

    #[test]
    fn test_parameters_default_when_missing() {
        let json = r#"{
            "id": "01HZZZZZZZZZZZZZZZZZZZZZZZ",
            "model_name": "e5",
            "chunk_size": 256,
            "chunk_overlap": 0,
            "created_at": "2024-01-15T00:00:00Z"
        }"#;
        let config: EmbeddingConfig = serde_json::from_str(json).unwrap();
        assert!(config.vectorizer_parameters.is_empty());
    }
}
