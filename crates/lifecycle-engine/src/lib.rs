//! # lifecycle-engine
//!
//! Lifecycle state machine, promotion protocol and production resolution for
//! index generations.
//!
//! - [`LifecycleManager`]: entity creation, `promote`, `rollback` and reads
//! - [`ProductionResolver`]: dataset name to production physical index
//! - [`MetadataRepository`]: typed store access with deadlines and a bounded
//!   read retry
//!
//! The engine keeps no state between calls. All state lives in the
//! [`lifecycle_storage::MetadataStore`] it is given.

pub mod manager;
pub mod repository;
pub mod resolver;

pub use manager::LifecycleManager;
pub use repository::{MetadataRepository, StorePolicy};
pub use resolver::{ConfigSelector, ProductionResolver};
