//! Lifecycle-aware retriever.
//!
//! Callers name a dataset, never a physical index. Every query re-resolves
//! the production generation, so promotions and rollbacks take effect on the
//! next call without restarting anything.

use std::sync::Arc;

use lifecycle_engine::{ConfigSelector, ProductionResolver};
use lifecycle_types::{
    IndexGeneration, LifecycleError, PhysicalIndexHandle, RetrievalSettings, SearchHit,
    SearchType,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::executor::SearchExecutor;

/// Errors from a retrieval call.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Resolution failed (no production index, store unavailable, ...)
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The search executor failed against the resolved index
    #[error("Search failed on index {handle}: {reason}")]
    Search {
        handle: PhysicalIndexHandle,
        reason: String,
    },
}

/// Hits plus the generation that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    /// Production generation the query was served from
    pub generation: IndexGeneration,
    /// Executor hits, best first
    pub hits: Vec<SearchHit>,
}

impl RetrievalResult {
    /// Physical index that served the query.
    pub fn handle(&self) -> &PhysicalIndexHandle {
        &self.generation.physical_index_handle
    }

    /// True when the executor returned no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Retriever bound to a dataset name.
pub struct LifecycleRetriever {
    resolver: ProductionResolver,
    executor: Arc<dyn SearchExecutor>,
    dataset_name: String,
    selector: Option<ConfigSelector>,
    search_type: SearchType,
    top_k: usize,
}

impl LifecycleRetriever {
    /// Retriever for `dataset_name` with default retrieval settings.
    pub fn new(
        resolver: ProductionResolver,
        executor: Arc<dyn SearchExecutor>,
        dataset_name: impl Into<String>,
    ) -> Self {
        let defaults = RetrievalSettings::default();
        Self {
            resolver,
            executor,
            dataset_name: dataset_name.into(),
            selector: None,
            search_type: defaults.search_type,
            top_k: defaults.top_k,
        }
    }

    /// Apply `top_k` and `search_type` from settings.
    pub fn with_settings(mut self, settings: &RetrievalSettings) -> Self {
        self.top_k = settings.top_k;
        self.search_type = settings.search_type;
        self
    }

    /// Restrict resolution to generations matching `selector`.
    pub fn with_selector(mut self, selector: ConfigSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the search type passed to the executor.
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Set the maximum number of hits.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Logical dataset name this retriever serves.
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Configured search type.
    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// Configured hit limit.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Resolve the current production index and search it.
    ///
    /// Resolution runs on every call, blank queries included; what a blank
    /// query matches is up to the executor.
    #[instrument(skip(self), fields(dataset = %self.dataset_name, search_type = %self.search_type))]
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult, RetrievalError> {
        let generation = self
            .resolver
            .resolve_production_generation(&self.dataset_name, self.selector.as_ref())
            .await?;
        let handle = &generation.physical_index_handle;

        let hits = self
            .executor
            .search(handle, query, self.search_type, self.top_k)
            .await
            .map_err(|reason| RetrievalError::Search {
                handle: handle.clone(),
                reason,
            })?;

        debug!(
            generation_id = %generation.id,
            handle = %handle,
            hits = hits.len(),
            "Retrieved"
        );
        Ok(RetrievalResult { generation, hits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSearchExecutor;
    use lifecycle_engine::{LifecycleManager, StorePolicy};
    use lifecycle_storage::InMemoryMetadataStore;
    use lifecycle_types::{LifecycleStatus, VectorizerParameters};

    async fn production_generation(manager: &LifecycleManager) -> IndexGeneration {
        let dataset = manager.create_dataset("Wiki", "v1.0").await.unwrap();
        let config = manager
            .register_embedding_config("e5", 512, 50, VectorizerParameters::new())
            .await
            .unwrap();
        let gen = manager
            .create_index_generation(&dataset.id, &config.id)
            .await
            .unwrap();
        for status in [
            LifecycleStatus::Indexing,
            LifecycleStatus::Staging,
            LifecycleStatus::Production,
        ] {
            manager.promote(&gen.id, status).await.unwrap();
        }
        gen
    }

    fn manager() -> LifecycleManager {
        LifecycleManager::new(Arc::new(InMemoryMetadataStore::new()), StorePolicy::default())
    }

    #[tokio::test]
    async fn test_retrieve_passes_handle_and_hits_through() {
        let manager = manager();
        let gen = production_generation(&manager).await;
        let executor = Arc::new(MockSearchExecutor::new().with_documents(
            &gen.physical_index_handle,
            ["the cat sat", "dogs bark"],
        ));

        let retriever = LifecycleRetriever::new(manager.resolver(), executor.clone(), "Wiki")
            .with_search_type(SearchType::Lexical);
        let result = retriever.retrieve("cat").await.unwrap();

        assert_eq!(result.handle(), &gen.physical_index_handle);
        assert_eq!(result.hits, vec![SearchHit::new("the cat sat", 1.0)]);
        assert_eq!(executor.searched_handles(), vec![gen.physical_index_handle]);
    }

    #[tokio::test]
    async fn test_blank_query_still_resolves() {
        let executor = Arc::new(MockSearchExecutor::new());
        let retriever = LifecycleRetriever::new(manager().resolver(), executor.clone(), "Missing");

        let result = retriever.retrieve("   ").await;
        assert!(matches!(
            result,
            Err(RetrievalError::Lifecycle(LifecycleError::NoProductionIndex { .. }))
        ));
        assert!(executor.searched_handles().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_reaches_executor() {
        let manager = manager();
        let gen = production_generation(&manager).await;
        let executor = Arc::new(
            MockSearchExecutor::new().with_documents(&gen.physical_index_handle, ["the cat sat"]),
        );

        let retriever = LifecycleRetriever::new(manager.resolver(), executor.clone(), "Wiki");
        let result = retriever.retrieve("").await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.generation.id, gen.id);
        assert_eq!(executor.searched_handles(), vec![gen.physical_index_handle]);
    }

    #[tokio::test]
    async fn test_missing_production_surfaces_lifecycle_error() {
        let retriever = LifecycleRetriever::new(
            manager().resolver(),
            Arc::new(MockSearchExecutor::new()),
            "NoSuchDataset",
        );
        let result = retriever.retrieve("anything").await;
        assert!(matches!(
            result,
            Err(RetrievalError::Lifecycle(LifecycleError::NoProductionIndex { .. }))
        ));
    }

    #[tokio::test]
    async fn test_executor_failure_names_handle() {
        let manager = manager();
        let gen = production_generation(&manager).await;
        let executor =
            Arc::new(MockSearchExecutor::new().with_failure(&gen.physical_index_handle));

        let retriever = LifecycleRetriever::new(manager.resolver(), executor, "Wiki");
        match retriever.retrieve("cat").await {
            Err(RetrievalError::Search { handle, .. }) => {
                assert_eq!(handle, gen.physical_index_handle)
            }
            other => panic!("expected Search error, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_applied() {
        let settings = RetrievalSettings {
            top_k: 9,
            search_type: SearchType::Lexical,
        };
        let retriever = LifecycleRetriever::new(
            manager().resolver(),
            Arc::new(MockSearchExecutor::new()),
            "Wiki",
        )
        .with_settings(&settings);
        assert_eq!(retriever.top_k(), 9);
        assert_eq!(retriever.search_type(), SearchType::Lexical);
        assert_eq!(retriever.dataset_name(), "Wiki");
    }
}
