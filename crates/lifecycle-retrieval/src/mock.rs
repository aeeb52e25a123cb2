//! In-memory search executor for tests and demos.
//!
//! Each physical index handle maps to a list of documents. Scoring is plain
//! term overlap:
//! - `Lexical`: number of query-term occurrences in the document
//! - `NearestNeighbor`: Jaccard similarity of the term sets
//!
//! Documents scoring zero are dropped; ties keep insertion order.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lifecycle_types::{PhysicalIndexHandle, SearchHit, SearchType};

use crate::executor::SearchExecutor;

/// Mock executor with per-handle documents.
#[derive(Default)]
pub struct MockSearchExecutor {
    documents: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    searched: Mutex<Vec<PhysicalIndexHandle>>,
}

impl MockSearchExecutor {
    /// Executor with no indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents to the index behind `handle`.
    pub fn with_documents<I, S>(mut self, handle: &PhysicalIndexHandle, docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents
            .entry(handle.as_str().to_string())
            .or_default()
            .extend(docs.into_iter().map(Into::into));
        self
    }

    /// Make every search against `handle` fail.
    pub fn with_failure(mut self, handle: &PhysicalIndexHandle) -> Self {
        self.failing.insert(handle.as_str().to_string());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handles searched so far, in call order.
    pub fn searched_handles(&self) -> Vec<PhysicalIndexHandle> {
        self.searched
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn score(query_terms: &[String], doc: &str, search_type: SearchType) -> f32 {
    let doc_terms = terms(doc);
    match search_type {
        SearchType::Lexical => doc_terms
            .iter()
            .filter(|t| query_terms.contains(t))
            .count() as f32,
        SearchType::NearestNeighbor => {
            let q: HashSet<&String> = query_terms.iter().collect();
            let d: HashSet<&String> = doc_terms.iter().collect();
            let union = q.union(&d).count();
            if union == 0 {
                0.0
            } else {
                q.intersection(&d).count() as f32 / union as f32
            }
        }
    }
}

#[async_trait]
impl SearchExecutor for MockSearchExecutor {
    async fn search(
        &self,
        handle: &PhysicalIndexHandle,
        query: &str,
        search_type: SearchType,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, String> {
        if let Ok(mut searched) = self.searched.lock() {
            searched.push(handle.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(handle.as_str()) {
            return Err(format!("index {} is unreachable", handle));
        }

        let docs = self
            .documents
            .get(handle.as_str())
            .ok_or_else(|| format!("no such index: {}", handle))?;

        let query_terms = terms(query);
        let mut hits: Vec<SearchHit> = docs
            .iter()
            .map(|doc| SearchHit::new(doc.clone(), score(&query_terms, doc, search_type)))
            .filter(|hit| hit.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}
