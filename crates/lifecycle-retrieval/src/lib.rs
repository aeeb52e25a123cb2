//! # lifecycle-retrieval
//!
//! Retriever facade for lifecycle-managed indexes.
//!
//! Clients hold a [`LifecycleRetriever`] for a dataset name. Each
//! [`retrieve`](LifecycleRetriever::retrieve) resolves the current production
//! generation and hands its physical index handle to a [`SearchExecutor`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lifecycle_retrieval::{LifecycleRetriever, MockSearchExecutor};
//! use std::sync::Arc;
//!
//! let retriever = LifecycleRetriever::new(manager.resolver(), Arc::new(executor), "Wiki")
//!     .with_top_k(4);
//! let result = retriever.retrieve("how do rollbacks work").await?;
//! for hit in result.hits {
//!     println!("{:.2} {}", hit.score, hit.content);
//! }
//! ```

pub mod executor;
pub mod mock;
pub mod retriever;

pub use executor::SearchExecutor;
pub use mock::MockSearchExecutor;
pub use retriever::{LifecycleRetriever, RetrievalError, RetrievalResult};
