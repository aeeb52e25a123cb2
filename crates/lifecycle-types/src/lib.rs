//! # lifecycle-types
//!
//! Shared domain types for index lifecycle management.
//!
//! This crate defines the entity model used throughout the system:
//! - [`RagDataset`]: a named, versioned logical corpus
//! - [`EmbeddingConfig`]: model plus chunking parameters
//! - [`IndexGeneration`]: one physical index of a dataset under a config
//! - [`LifecycleStatus`]: the closed state set and its transition table
//! - [`LifecycleError`]: the error taxonomy shared by the engine and resolver
//! - [`Settings`]: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use lifecycle_types::{IndexGeneration, LifecycleStatus};
//!
//! let gen = IndexGeneration::new("dataset-id", "config-id");
//! assert_eq!(gen.status, LifecycleStatus::Draft);
//! assert!(gen.status.can_transition_to(LifecycleStatus::Indexing));
//! ```

pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod record;
pub mod search;
pub mod status;

pub use config::{RetrievalSettings, Settings, StoreSettings};
pub use dataset::RagDataset;
pub use embedding::{EmbeddingConfig, VectorizerParameters};
pub use error::LifecycleError;
pub use generation::{IndexGeneration, PhysicalIndexHandle};
pub use record::{new_id, Record, RecordType};
pub use search::{SearchHit, SearchType};
pub use status::LifecycleStatus;
