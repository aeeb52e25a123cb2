//! Index generation lifecycle management.
//!
//! This module owns entity creation and the promotion protocol:
//! - Creating datasets, embedding configs and generations
//! - Moving generations through the transition table
//! - Demoting the incumbent when a generation goes to production
//! - Rolling back to a deprecated generation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lifecycle_engine::{LifecycleManager, StorePolicy};
//! use lifecycle_storage::InMemoryMetadataStore;
//! use lifecycle_types::LifecycleStatus;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryMetadataStore::new());
//! let manager = LifecycleManager::new(store, StorePolicy::default());
//! let dataset = manager.create_dataset("Wiki", "v1.0").await?;
//! let config = manager.register_embedding_config("e5", 512, 50, Default::default()).await?;
//! let gen = manager.create_index_generation(&dataset.id, &config.id).await?;
//!
//! manager.promote(&gen.id, LifecycleStatus::Indexing).await?;
//! manager.promote(&gen.id, LifecycleStatus::Staging).await?;
//! manager.promote(&gen.id, LifecycleStatus::Production).await?;
//! ```
//!
//! Promotion to production is two separately persisted steps: demote every
//! current production generation of the dataset, then write the target. There
//! is no multi-record transaction, so a concurrent reader may briefly observe
//! zero or two production generations; the resolver's tie-break covers that.

use std::sync::Arc;

use chrono::Utc;
use lifecycle_storage::{Filter, MetadataStore, RecordQuery, SortOrder};
use lifecycle_types::{
    EmbeddingConfig, IndexGeneration, LifecycleError, LifecycleStatus, RagDataset, Record,
    VectorizerParameters,
};
use tracing::{debug, info, instrument, warn};

use crate::repository::{MetadataRepository, StorePolicy};
use crate::resolver::ProductionResolver;

/// Creates lifecycle entities and runs the promotion protocol.
///
/// Holds no state between calls; the metadata store is the source of truth.
#[derive(Clone)]
pub struct LifecycleManager {
    repo: MetadataRepository,
}

impl LifecycleManager {
    /// Manager over `store`, calling it under `policy`.
    pub fn new(store: Arc<dyn MetadataStore>, policy: StorePolicy) -> Self {
        Self::with_repository(MetadataRepository::new(store, policy))
    }

    /// Manager over an existing repository.
    pub fn with_repository(repo: MetadataRepository) -> Self {
        Self { repo }
    }

    /// Underlying typed repository.
    pub fn repository(&self) -> &MetadataRepository {
        &self.repo
    }

    /// A resolver reading through the same repository.
    pub fn resolver(&self) -> ProductionResolver {
        ProductionResolver::new(self.repo.clone())
    }

    /// Register a new dataset version.
    #[instrument(skip(self))]
    pub async fn create_dataset(
        &self,
        name: &str,
        version: &str,
    ) -> Result<RagDataset, LifecycleError> {
        let dataset = RagDataset::new(name, version)?;
        self.repo.put(&dataset).await?;

        info!(
            dataset_id = %dataset.id,
            name = %dataset.name,
            version = %dataset.version,
            "Created dataset"
        );
        Ok(dataset)
    }

    /// Register an embedding strategy.
    ///
    /// Parameters are validated locally; invalid input never reaches the
    /// store. Duplicate registrations are allowed and get distinct ids.
    #[instrument(skip(self, vectorizer_parameters))]
    pub async fn register_embedding_config(
        &self,
        model_name: &str,
        chunk_size: u32,
        chunk_overlap: u32,
        vectorizer_parameters: VectorizerParameters,
    ) -> Result<EmbeddingConfig, LifecycleError> {
        let config =
            EmbeddingConfig::new(model_name, chunk_size, chunk_overlap, vectorizer_parameters)?;
        self.repo.put(&config).await?;

        info!(
            config_id = %config.id,
            model_name = %config.model_name,
            chunk_size,
            chunk_overlap,
            "Registered embedding config"
        );
        Ok(config)
    }

    /// Create a generation in `Draft` for an existing dataset and config.
    #[instrument(skip(self))]
    pub async fn create_index_generation(
        &self,
        dataset_id: &str,
        config_id: &str,
    ) -> Result<IndexGeneration, LifecycleError> {
        self.require_reference::<RagDataset>(dataset_id).await?;
        self.require_reference::<EmbeddingConfig>(config_id).await?;

        let generation = IndexGeneration::new(dataset_id, config_id);
        self.repo.put(&generation).await?;

        info!(
            generation_id = %generation.id,
            handle = %generation.physical_index_handle,
            "Created index generation"
        );
        Ok(generation)
    }

    async fn require_reference<R: Record>(&self, id: &str) -> Result<(), LifecycleError> {
        match self.repo.get::<R>(id).await? {
            Some(_) => Ok(()),
            None => Err(LifecycleError::UnknownReference {
                kind: R::RECORD_TYPE,
                id: id.to_string(),
            }),
        }
    }

    async fn require<R: Record>(&self, id: &str) -> Result<R, LifecycleError> {
        self.repo
            .get::<R>(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                kind: R::RECORD_TYPE,
                id: id.to_string(),
            })
    }

    /// Fetch a dataset, `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn get_dataset(&self, dataset_id: &str) -> Result<RagDataset, LifecycleError> {
        self.require(dataset_id).await
    }

    /// Fetch an embedding config, `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn get_embedding_config(
        &self,
        config_id: &str,
    ) -> Result<EmbeddingConfig, LifecycleError> {
        self.require(config_id).await
    }

    /// Fetch an index generation, `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn get_index_generation(
        &self,
        generation_id: &str,
    ) -> Result<IndexGeneration, LifecycleError> {
        self.require(generation_id).await
    }

    /// Current status of a generation.
    #[instrument(skip(self))]
    pub async fn get_status(&self, generation_id: &str) -> Result<LifecycleStatus, LifecycleError> {
        Ok(self.get_index_generation(generation_id).await?.status)
    }

    /// Every version of a dataset with the given name, oldest first.
    #[instrument(skip(self))]
    pub async fn find_datasets(&self, name: &str) -> Result<Vec<RagDataset>, LifecycleError> {
        let query = RecordQuery::new(Filter::eq("name", name))
            .sorted_by("created_at", SortOrder::Ascending);
        self.repo.query(&query).await
    }

    /// All datasets, oldest first.
    #[instrument(skip(self))]
    pub async fn list_datasets(&self) -> Result<Vec<RagDataset>, LifecycleError> {
        let query = RecordQuery::all().sorted_by("created_at", SortOrder::Ascending);
        self.repo.query(&query).await
    }

    /// Generations of a dataset ordered by `created_at`, then `id`.
    #[instrument(skip(self))]
    pub async fn list_generations(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<IndexGeneration>, LifecycleError> {
        let query = RecordQuery::new(Filter::eq("dataset_id", dataset_id));
        let mut generations: Vec<IndexGeneration> = self.repo.query(&query).await?;
        generations.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(generations)
    }

    /// Move a generation to `target`.
    ///
    /// Promotion to production first demotes every other production
    /// generation of the same dataset, found by a fresh query. Safe to re-run
    /// after a partial failure: the next attempt re-derives the incumbents.
    #[instrument(skip(self))]
    pub async fn promote(
        &self,
        generation_id: &str,
        target: LifecycleStatus,
    ) -> Result<IndexGeneration, LifecycleError> {
        let current = self.get_index_generation(generation_id).await?;

        if !current.status.can_transition_to(target) {
            debug!(from = %current.status, "Rejected transition");
            return Err(LifecycleError::InvalidTransition {
                generation_id: generation_id.to_string(),
                from: current.status,
                to: target,
            });
        }

        if target == LifecycleStatus::Production {
            self.demote_production_incumbents(&current).await?;
        }

        let updated = current.with_status(target, Utc::now());
        self.repo.put(&updated).await?;

        info!(
            generation_id = %updated.id,
            dataset_id = %updated.dataset_id,
            from = %current.status,
            to = %target,
            "Transitioned index generation"
        );
        Ok(updated)
    }

    /// Restore a deprecated generation to production.
    #[instrument(skip(self))]
    pub async fn rollback(&self, generation_id: &str) -> Result<IndexGeneration, LifecycleError> {
        let current = self.get_index_generation(generation_id).await?;
        if current.status != LifecycleStatus::Deprecated {
            return Err(LifecycleError::InvalidTransition {
                generation_id: generation_id.to_string(),
                from: current.status,
                to: LifecycleStatus::Production,
            });
        }

        info!(generation_id, "Rolling back to deprecated generation");
        self.promote(generation_id, LifecycleStatus::Production)
            .await
    }

    /// Deprecate every production generation of the target's dataset other
    /// than the target itself. Returns how many were demoted.
    async fn demote_production_incumbents(
        &self,
        target: &IndexGeneration,
    ) -> Result<usize, LifecycleError> {
        let query = RecordQuery::new(
            Filter::eq("dataset_id", target.dataset_id.as_str())
                .and(Filter::eq("status", LifecycleStatus::Production.as_str())),
        );
        let incumbents: Vec<IndexGeneration> = self.repo.query(&query).await?;

        if incumbents.len() > 1 {
            warn!(
                dataset_id = %target.dataset_id,
                count = incumbents.len(),
                "Found multiple production generations; demoting all"
            );
        }

        let mut demoted = 0;
        for incumbent in incumbents.into_iter().filter(|g| g.id != target.id) {
            let deprecated = incumbent.with_status(LifecycleStatus::Deprecated, Utc::now());
            self.repo.put(&deprecated).await?;
            info!(
                generation_id = %deprecated.id,
                replaced_by = %target.id,
                "Demoted production generation"
            );
            demoted += 1;
        }
        Ok(demoted)
    }
}
