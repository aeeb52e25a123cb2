//! Error types for index lifecycle operations.

use thiserror::Error;

use crate::record::RecordType;
use crate::status::LifecycleStatus;

/// Unified error type for lifecycle, resolution and entity operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed embedding config parameters (never reaches the store)
    #[error("Invalid embedding config: {0}")]
    InvalidConfig(String),

    /// Other local validation failure
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced dataset or config does not exist
    #[error("Unknown {kind} reference: {id}")]
    UnknownReference { kind: RecordType, id: String },

    /// The record being read or promoted does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordType, id: String },

    /// Requested transition is not in the transition table
    #[error("Invalid transition for generation {generation_id}: {from} -> {to}")]
    InvalidTransition {
        generation_id: String,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },

    /// No production generation matched the dataset name and selector
    #[error("No production index for dataset '{dataset_name}'{}", describe_selector(.selector))]
    NoProductionIndex {
        dataset_name: String,
        selector: Option<String>,
    },

    /// Metadata store failed or exceeded its deadline
    #[error("Metadata store unavailable during {operation}: {reason}")]
    StoreUnavailable { operation: String, reason: String },

    /// A stored record could not be decoded
    #[error("Corrupt {kind} record: {reason}")]
    CorruptRecord { kind: RecordType, reason: String },

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_selector(selector: &Option<String>) -> String {
    match selector {
        Some(s) => format!(" (selector: {})", s),
        None => String::new(),
    }
}

impl LifecycleError {
    /// Whether re-issuing the same call may succeed.
    ///
    /// Only store failures qualify; everything else is deterministic given
    /// the current metadata.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::StoreUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = LifecycleError::InvalidTransition {
            generation_id: "gen-1".to_string(),
            from: LifecycleStatus::Staging,
            to: LifecycleStatus::Staging,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition for generation gen-1: staging -> staging"
        );
    }

    #[test]
    fn test_no_production_index_message() {
        let err = LifecycleError::NoProductionIndex {
            dataset_name: "Wiki".to_string(),
            selector: None,
        };
        assert_eq!(err.to_string(), "No production index for dataset 'Wiki'");

        let err = LifecycleError::NoProductionIndex {
            dataset_name: "Wiki".to_string(),
            selector: Some("model_name=e5".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "No production index for dataset 'Wiki' (selector: model_name=e5)"
        );
    }

    #[test]
    fn test_unknown_reference_names_the_kind() {
        let err = LifecycleError::UnknownReference {
            kind: RecordType::EmbeddingConfig,
            id: "cfg-9".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown embedding config reference: cfg-9");
    }

    #[test]
    fn test_only_store_errors_are_retryable() {
        let unavailable = LifecycleError::StoreUnavailable {
            operation: "get index generation".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(unavailable.is_retryable());
        assert!(!LifecycleError::InvalidConfig("x".to_string()).is_retryable());
    }
}
