//! The search-execution collaborator.

use async_trait::async_trait;
use lifecycle_types::{PhysicalIndexHandle, SearchHit, SearchType};

/// Runs a query against one physical index.
///
/// Implementations own the data plane (vector search, BM25, ...). Hits are
/// returned best first and passed to callers untouched.
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    async fn search(
        &self,
        handle: &PhysicalIndexHandle,
        query: &str,
        search_type: SearchType,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, String>;
}
