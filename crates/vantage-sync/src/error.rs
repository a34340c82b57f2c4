//! Error types for the vantage-sync crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The topology violates its own schema (duplicate ids, dangling
    /// links, malformed definitions). Fatal: nothing is written.
    #[error("Topology schema violation: {reason}")]
    Schema { reason: String },

    /// A delta entry referenced an entity the episode never ingested.
    /// Recovered locally: the entry is skipped and logged, never returned
    /// from `apply_observation_delta`.
    #[error("Unknown {kind} referenced in delta: {id}")]
    UnknownEntity { kind: String, id: String },

    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(#[from] vantage_graph::GraphError),
}

impl SyncError {
    pub fn schema(reason: impl Into<String>) -> Self {
        SyncError::Schema {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
