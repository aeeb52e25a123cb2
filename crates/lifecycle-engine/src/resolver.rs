//! Production index resolution.
//!
//! Maps a dataset name (and optionally a config) to the physical index that
//! currently serves live queries. Nothing is cached: each call reads the
//! store, so a promotion is visible to the very next resolution.

use lifecycle_storage::{Filter, RecordQuery};
use lifecycle_types::{
    EmbeddingConfig, IndexGeneration, LifecycleError, LifecycleStatus, PhysicalIndexHandle,
    RagDataset,
};
use tracing::{debug, instrument, warn};

use crate::repository::MetadataRepository;

/// Narrows resolution to generations built with a particular config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSelector {
    /// Exactly this embedding config
    ConfigId(String),
    /// Any config registered for this model
    ModelName(String),
}

impl std::fmt::Display for ConfigSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSelector::ConfigId(id) => write!(f, "config_id={}", id),
            ConfigSelector::ModelName(model) => write!(f, "model_name={}", model),
        }
    }
}

/// Finds the production generation for a dataset name.
#[derive(Clone)]
pub struct ProductionResolver {
    repo: MetadataRepository,
}

impl ProductionResolver {
    /// Resolver reading through `repo`.
    pub fn new(repo: MetadataRepository) -> Self {
        Self { repo }
    }

    /// Physical index handle of the production generation.
    pub async fn resolve_production(
        &self,
        dataset_name: &str,
        selector: Option<&ConfigSelector>,
    ) -> Result<PhysicalIndexHandle, LifecycleError> {
        self.resolve_production_generation(dataset_name, selector)
            .await
            .map(|generation| generation.physical_index_handle)
    }

    /// The production generation itself.
    ///
    /// Several candidates are tolerated (a promotion may be mid-flight); the
    /// most recent by `updated_at`, then `created_at`, then `id` wins.
    #[instrument(skip(self))]
    pub async fn resolve_production_generation(
        &self,
        dataset_name: &str,
        selector: Option<&ConfigSelector>,
    ) -> Result<IndexGeneration, LifecycleError> {
        let miss = || LifecycleError::NoProductionIndex {
            dataset_name: dataset_name.to_string(),
            selector: selector.map(ToString::to_string),
        };

        let datasets: Vec<RagDataset> = self
            .repo
            .query(&RecordQuery::new(Filter::eq("name", dataset_name)))
            .await?;
        if datasets.is_empty() {
            debug!("No dataset with this name");
            return Err(miss());
        }

        let mut filter = Filter::any_of("dataset_id", datasets.into_iter().map(|d| d.id))
            .and(Filter::eq("status", LifecycleStatus::Production.as_str()));

        match selector {
            None => {}
            Some(ConfigSelector::ConfigId(config_id)) => {
                filter = filter.and(Filter::eq("config_id", config_id.as_str()));
            }
            Some(ConfigSelector::ModelName(model_name)) => {
                let configs: Vec<EmbeddingConfig> = self
                    .repo
                    .query(&RecordQuery::new(Filter::eq(
                        "model_name",
                        model_name.as_str(),
                    )))
                    .await?;
                if configs.is_empty() {
                    debug!("No embedding config for this model");
                    return Err(miss());
                }
                filter = filter.and(Filter::any_of(
                    "config_id",
                    configs.into_iter().map(|c| c.id),
                ));
            }
        }

        let candidates: Vec<IndexGeneration> =
            self.repo.query(&RecordQuery::new(filter)).await?;

        if candidates.len() > 1 {
            warn!(
                dataset_name,
                candidates = candidates.len(),
                "Multiple production generations; choosing most recently updated"
            );
        }

        let chosen = candidates
            .into_iter()
            .max_by(|a, b| a.recency_cmp(b))
            .ok_or_else(miss)?;

        debug!(
            generation_id = %chosen.id,
            handle = %chosen.physical_index_handle,
            "Resolved production generation"
        );
        Ok(chosen)
    }
}
