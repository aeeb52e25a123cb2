//! Typed access to the metadata store under a call policy.
//!
//! Every store call runs under a deadline. Reads (`get`, `query`) are
//! idempotent and get one retry with exponential backoff when the store is
//! unavailable; writes are attempted exactly once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use lifecycle_storage::{decode, encode, MetadataStore, RecordQuery, StorageError};
use lifecycle_types::{LifecycleError, Record, RecordType, StoreSettings};
use tracing::{debug, warn};

/// Deadline and retry policy for store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePolicy {
    /// Deadline for each individual store call
    pub timeout: Duration,
    /// Retry a failed read once
    pub read_retry: bool,
    /// Backoff before the retry
    pub initial_backoff: Duration,
    /// Cap on the backoff interval
    pub max_backoff: Duration,
}

impl StorePolicy {
    /// Replace the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable the single read retry.
    pub fn without_read_retry(mut self) -> Self {
        self.read_retry = false;
        self
    }
}

impl From<&StoreSettings> for StorePolicy {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            read_retry: settings.read_retry,
            initial_backoff: Duration::from_millis(settings.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.retry_max_backoff_ms),
        }
    }
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self::from(&StoreSettings::default())
    }
}

/// Typed repository over a [`MetadataStore`].
#[derive(Clone)]
pub struct MetadataRepository {
    store: Arc<dyn MetadataStore>,
    policy: StorePolicy,
}

impl MetadataRepository {
    /// Wrap a store with the given call policy.
    pub fn new(store: Arc<dyn MetadataStore>, policy: StorePolicy) -> Self {
        Self { store, policy }
    }

    /// Policy applied to every store call.
    pub fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    /// Fetch a record by id.
    pub async fn get<R: Record>(&self, id: &str) -> Result<Option<R>, LifecycleError> {
        let kind = R::RECORD_TYPE;
        let operation = format!("get {} {}", kind, id);
        let raw = self
            .read(&operation, kind, || self.store.get(kind, id))
            .await?;
        raw.map(|value| decode_record::<R>(value)).transpose()
    }

    /// Run a query and decode every match.
    pub async fn query<R: Record>(&self, query: &RecordQuery) -> Result<Vec<R>, LifecycleError> {
        let kind = R::RECORD_TYPE;
        let operation = format!("query {} where {}", kind, query);
        let raw = self
            .read(&operation, kind, || self.store.query(kind, query))
            .await?;
        debug!(record_type = %kind, query = %query, matched = raw.len(), "Query completed");
        raw.into_iter().map(decode_record::<R>).collect()
    }

    /// Persist a record. Never retried.
    pub async fn put<R: Record>(&self, record: &R) -> Result<(), LifecycleError> {
        let kind = R::RECORD_TYPE;
        let operation = format!("put {} {}", kind, record.id());
        let value = encode(record).map_err(|e| map_storage_error(kind, &operation, e))?;
        self.attempt(&operation, kind, self.store.put(kind, value))
            .await?;
        debug!(record_type = %kind, id = %record.id(), "Record persisted");
        Ok(())
    }

    /// One store call under the deadline.
    async fn attempt<T, Fut>(
        &self,
        operation: &str,
        kind: RecordType,
        call: Fut,
    ) -> Result<T, LifecycleError>
    where
        Fut: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.policy.timeout, call).await {
            Ok(result) => result.map_err(|e| map_storage_error(kind, operation, e)),
            Err(_) => Err(LifecycleError::StoreUnavailable {
                operation: operation.to_string(),
                reason: format!(
                    "deadline of {}ms exceeded",
                    self.policy.timeout.as_millis()
                ),
            }),
        }
    }

    /// A read with at most one retry on store unavailability.
    async fn read<T, F, Fut>(
        &self,
        operation: &str,
        kind: RecordType,
        mut call: F,
    ) -> Result<T, LifecycleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.policy.initial_backoff)
            .with_max_interval(self.policy.max_backoff)
            .with_max_elapsed_time(None)
            .build();
        let mut retries_left = u32::from(self.policy.read_retry);

        loop {
            match self.attempt(operation, kind, call()).await {
                Err(e) if e.is_retryable() && retries_left > 0 => {
                    retries_left -= 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or(self.policy.initial_backoff);
                    warn!(
                        operation = %operation,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Store read failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn decode_record<R: Record>(value: serde_json::Value) -> Result<R, LifecycleError> {
    decode(value).map_err(|e| LifecycleError::CorruptRecord {
        kind: R::RECORD_TYPE,
        reason: e.to_string(),
    })
}

/// Malformed data is a record problem; everything else means the store
/// could not serve the call.
fn map_storage_error(kind: RecordType, operation: &str, err: StorageError) -> LifecycleError {
    match err {
        StorageError::Serialization(reason) => LifecycleError::CorruptRecord { kind, reason },
        StorageError::MissingId(_) => LifecycleError::CorruptRecord {
            kind,
            reason: err.to_string(),
        },
        other => LifecycleError::StoreUnavailable {
            operation: operation.to_string(),
            reason: other.to_string(),
        },
    }
}
