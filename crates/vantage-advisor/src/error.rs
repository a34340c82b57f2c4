//! Error types for the vantage-advisor crate.

use thiserror::Error;

use vantage_core::types::EpisodeId;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Mask or feature query against an EMPTY partition: no topology has
    /// been ingested for this episode. Fatal to the call.
    #[error("Episode {episode} has no ingested topology")]
    NotInitialized { episode: EpisodeId },

    /// The action space references a host or exploit category the episode
    /// never ingested. Caller/schema mismatch, fatal, never retried.
    #[error("Action template {label} is outside the ingested schema: {reason}")]
    UnknownAction { label: String, reason: String },

    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(#[from] vantage_graph::GraphError),
}

impl AdvisorError {
    pub fn unknown_action(label: impl Into<String>, reason: impl Into<String>) -> Self {
        AdvisorError::UnknownAction {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
