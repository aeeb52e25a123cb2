//! Lifecycle states of an index generation.
//!
//! The transition table lives in [`LifecycleStatus::allowed_targets`] and
//! nowhere else; every other check goes through it.
//!
//! ```text
//! DRAFT -> INDEXING -> STAGING -> PRODUCTION -> DEPRECATED -> ARCHIVED
//!   ^         |           |                        |
//!   +---------+-----------+        PRODUCTION <----+ (rollback)
//! ```

use serde::{Deserialize, Serialize};

/// Status of an index generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Metadata recorded, physical index provisioned but empty
    Draft,
    /// External ingestion is populating the physical index
    Indexing,
    /// Populated and awaiting validation
    Staging,
    /// Authoritative for live queries
    Production,
    /// Formerly production; kept warm for rollback
    Deprecated,
    /// Terminal
    Archived,
}

impl LifecycleStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [LifecycleStatus; 6] = [
        LifecycleStatus::Draft,
        LifecycleStatus::Indexing,
        LifecycleStatus::Staging,
        LifecycleStatus::Production,
        LifecycleStatus::Deprecated,
        LifecycleStatus::Archived,
    ];

    /// Statuses reachable in one step from `self`.
    pub fn allowed_targets(&self) -> &'static [LifecycleStatus] {
        use LifecycleStatus::*;
        match self {
            Draft => &[Indexing, Archived],
            Indexing => &[Staging, Draft, Archived],
            Staging => &[Production, Draft, Archived],
            Production => &[Deprecated],
            Deprecated => &[Production, Archived],
            Archived => &[],
        }
    }

    /// Whether `self -> target` appears in the transition table.
    pub fn can_transition_to(&self, target: LifecycleStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Archived generations never move again.
    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Stored representation (`"draft"`, `"production"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Draft => "draft",
            LifecycleStatus::Indexing => "indexing",
            LifecycleStatus::Staging => "staging",
            LifecycleStatus::Production => "production",
            LifecycleStatus::Deprecated => "deprecated",
            LifecycleStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        LifecycleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "Unknown lifecycle status '{}'. Expected one of: \
                     draft, indexing, staging, production, deprecated, archived",
                    s
                )
            })
    }
}
