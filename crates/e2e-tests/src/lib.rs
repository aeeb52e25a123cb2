//! End-to-end test infrastructure for index-lifecycle.
//!
//! Provides a shared TestHarness over a temporary RocksDB metadata store,
//! a fault-injecting store wrapper, and helpers that drive generations
//! through the lifecycle.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lifecycle_engine::{LifecycleManager, ProductionResolver, StorePolicy};
use lifecycle_retrieval::{LifecycleRetriever, SearchExecutor};
use lifecycle_storage::{
    encode, MetadataStore, RecordQuery, RocksMetadataStore, StorageError, StoredRecord,
};
use lifecycle_types::{
    EmbeddingConfig, IndexGeneration, LifecycleStatus, RagDataset, RecordType,
    VectorizerParameters,
};

/// Path from a fresh DRAFT generation to PRODUCTION.
pub const TO_PRODUCTION: [LifecycleStatus; 3] = [
    LifecycleStatus::Indexing,
    LifecycleStatus::Staging,
    LifecycleStatus::Production,
];

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// The RocksDB store underneath the fault injector
    pub store: Arc<RocksMetadataStore>,
    /// Fault injector the manager talks to (no faults unless asked)
    pub faults: Arc<FaultyStore>,
    /// Manager over `faults`
    pub manager: LifecycleManager,
}

impl TestHarness {
    /// Harness with a short deadline and near-zero retry backoff.
    pub fn new() -> Self {
        Self::with_policy(fast_policy())
    }

    /// Create a harness whose manager uses the given store policy.
    pub fn with_policy(policy: StorePolicy) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            RocksMetadataStore::open(temp_dir.path()).expect("Failed to open test storage"),
        );
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let manager = LifecycleManager::new(faults.clone(), policy);

        Self {
            _temp_dir: temp_dir,
            store,
            faults,
            manager,
        }
    }

    /// Resolver sharing the harness store.
    pub fn resolver(&self) -> ProductionResolver {
        self.manager.resolver()
    }

    /// Retriever for `dataset_name` backed by `executor`.
    pub fn retriever(
        &self,
        dataset_name: &str,
        executor: Arc<dyn SearchExecutor>,
    ) -> LifecycleRetriever {
        LifecycleRetriever::new(self.resolver(), executor, dataset_name)
    }

    /// Create a dataset and one embedding config for it.
    pub async fn seed(
        &self,
        name: &str,
        version: &str,
        model: &str,
    ) -> (RagDataset, EmbeddingConfig) {
        let dataset = self
            .manager
            .create_dataset(name, version)
            .await
            .expect("Failed to create dataset");
        let config = self
            .manager
            .register_embedding_config(model, 512, 50, VectorizerParameters::new())
            .await
            .expect("Failed to register config");
        (dataset, config)
    }

    /// Create a generation and walk it to `STAGING`.
    pub async fn staged_generation(&self, dataset_id: &str, config_id: &str) -> IndexGeneration {
        let gen = self
            .manager
            .create_index_generation(dataset_id, config_id)
            .await
            .expect("Failed to create generation");
        self.promote_through(&gen.id, &TO_PRODUCTION[..2]).await
    }

    /// Create a generation and walk it all the way to `PRODUCTION`.
    pub async fn production_generation(
        &self,
        dataset_id: &str,
        config_id: &str,
    ) -> IndexGeneration {
        let gen = self.staged_generation(dataset_id, config_id).await;
        self.promote_through(&gen.id, &[LifecycleStatus::Production])
            .await
    }

    /// Apply each status in order, returning the final record.
    pub async fn promote_through(
        &self,
        generation_id: &str,
        path: &[LifecycleStatus],
    ) -> IndexGeneration {
        let mut current = self
            .manager
            .get_index_generation(generation_id)
            .await
            .expect("Failed to read generation");
        for status in path {
            current = self
                .manager
                .promote(generation_id, *status)
                .await
                .unwrap_or_else(|e| panic!("promote to {} failed: {}", status, e));
        }
        current
    }

    /// Write a generation record straight to the store, bypassing the
    /// promotion protocol.
    pub async fn write_generation(&self, generation: &IndexGeneration) {
        let record = encode(generation).expect("Failed to encode generation");
        self.store
            .put(RecordType::IndexGeneration, record)
            .await
            .expect("Failed to write generation");
    }

    /// Every generation of a dataset currently in `PRODUCTION`.
    pub async fn production_of(&self, dataset_id: &str) -> Vec<IndexGeneration> {
        self.manager
            .list_generations(dataset_id)
            .await
            .expect("Failed to list generations")
            .into_iter()
            .filter(IndexGeneration::is_production)
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Policy with a 2s deadline and 1ms retry backoff.
pub fn fast_policy() -> StorePolicy {
    StorePolicy {
        timeout: Duration::from_secs(2),
        read_retry: true,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

/// Store wrapper that injects failures and latency.
///
/// - `fail_reads(n)`: the next `n` reads (`get` or `query`) fail
/// - `fail_writes_after(k)`: `k` more writes succeed, then every write fails
/// - `set_delay(d)`: every call sleeps `d` first
pub struct FaultyStore {
    inner: Arc<dyn MetadataStore>,
    reads_to_fail: AtomicUsize,
    writes_allowed: AtomicUsize,
    delay_ms: AtomicU64,
    read_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl FaultyStore {
    /// Wrap a store with no faults injected.
    pub fn new(inner: Arc<dyn MetadataStore>) -> Self {
        Self {
            inner,
            reads_to_fail: AtomicUsize::new(0),
            writes_allowed: AtomicUsize::new(usize::MAX),
            delay_ms: AtomicU64::new(0),
            read_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` reads.
    pub fn fail_reads(&self, count: usize) {
        self.reads_to_fail.store(count, Ordering::SeqCst);
    }

    /// Let `successes` more writes through, then fail every write.
    pub fn fail_writes_after(&self, successes: usize) {
        self.writes_allowed.store(successes, Ordering::SeqCst);
    }

    /// Sleep for `delay` before every call.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Remove every fault and reset the call counters.
    pub fn heal(&self) {
        self.reads_to_fail.store(0, Ordering::SeqCst);
        self.writes_allowed.store(usize::MAX, Ordering::SeqCst);
        self.delay_ms.store(0, Ordering::SeqCst);
        self.read_calls.store(0, Ordering::SeqCst);
        self.write_calls.store(0, Ordering::SeqCst);
    }

    /// Reads seen since the last `heal`.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Writes seen since the last `heal`.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    async fn enter_read(&self) -> Result<(), StorageError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let failed = self
            .reads_to_fail
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StorageError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }

    async fn enter_write(&self) -> Result<(), StorageError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let allowed = self
            .writes_allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                usize::MAX => Some(n),
                _ => n.checked_sub(1),
            })
            .is_ok();
        if !allowed {
            return Err(StorageError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FaultyStore {
    async fn put(&self, record_type: RecordType, record: StoredRecord) -> Result<(), StorageError> {
        self.enter_write().await?;
        self.inner.put(record_type, record).await
    }

    async fn get(
        &self,
        record_type: RecordType,
        id: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        self.enter_read().await?;
        self.inner.get(record_type, id).await
    }

    async fn query(
        &self,
        record_type: RecordType,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        self.enter_read().await?;
        self.inner.query(record_type, query).await
    }
}
