//! vantage-core: Shared domain types for the Vantage knowledge layer.
//!
//! This crate defines the vocabulary every Vantage component speaks:
//! - Episode and entity identifiers for the knowledge graph
//! - Topology and observation-delta types forming the environment adapter
//!   boundary (typed, unknown fields rejected)
//! - The action-space and action-mask types forming the decision agent
//!   boundary

pub mod actions;
pub mod types;

pub use actions::{ActionKind, ActionMask, ActionSpace, ActionTemplate};
pub use types::{EpisodeId, HostId, ObservationDelta, Topology};
