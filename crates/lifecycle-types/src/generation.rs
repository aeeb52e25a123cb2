//! Index generations: one physical materialization of a dataset under an
//! embedding config.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{new_id, Record, RecordType};
use crate::status::LifecycleStatus;

/// Opaque name of the physical collection backing a generation.
///
/// Derived from the generation id, so it is collision-free and can be
/// provisioned before any data is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalIndexHandle(String);

impl PhysicalIndexHandle {
    /// Handle for the given generation id: `Index_<id>`.
    pub fn for_generation(generation_id: &str) -> Self {
        let sanitized: String = generation_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        Self(format!("Index_{}", sanitized))
    }

    /// Handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the handle, returning the owned name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PhysicalIndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lifecycle-tracked physical index for one (dataset, config) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexGeneration {
    /// Unique identifier (ULID)
    pub id: String,
    /// Owning dataset
    pub dataset_id: String,
    /// Embedding config used to build the index
    pub config_id: String,
    /// Current lifecycle status
    pub status: LifecycleStatus,
    /// Underlying storage collection
    pub physical_index_handle: PhysicalIndexHandle,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status change
    pub updated_at: DateTime<Utc>,
}

impl IndexGeneration {
    /// New generation in `Draft` with a freshly allocated handle.
    pub fn new(dataset_id: impl Into<String>, config_id: impl Into<String>) -> Self {
        let id = new_id();
        let now = Utc::now();
        Self {
            physical_index_handle: PhysicalIndexHandle::for_generation(&id),
            id,
            dataset_id: dataset_id.into(),
            config_id: config_id.into(),
            status: LifecycleStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this generation moved to `status` at `at`.
    ///
    /// Does not consult the transition table; callers validate first.
    pub fn with_status(&self, status: LifecycleStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: at,
            ..self.clone()
        }
    }

    /// True when the generation is currently serving.
    pub fn is_production(&self) -> bool {
        self.status == LifecycleStatus::Production
    }

    /// Recency order used to pick among production candidates:
    /// `updated_at`, then `created_at`, then `id`.
    ///
    /// Total over distinct ids, so the greatest element is unique.
    pub fn recency_cmp(&self, other: &IndexGeneration) -> Ordering {
        self.updated_at
            .cmp(&other.updated_at)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Record for IndexGeneration {
    const RECORD_TYPE: RecordType = RecordType::IndexGeneration;

    fn id(&self) -> &str {
        &self.id
    }
}
