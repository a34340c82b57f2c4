//! vantage-graph: Neo4j access layer for the episode-partitioned
//! knowledge graph.
//!
//! This crate is the single access point for the knowledge graph. Every
//! statement it issues is keyed on an episode partition, writes are
//! idempotent MERGE upserts, and host flags can only move forward
//! (undiscovered → discovered, unowned → owned, privilege up).

pub mod client;
pub mod mutations;
pub mod queries;
pub mod schema;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use queries::{
    CredentialAccessRow, EpisodeMarker, ExposureRow, GraphStats, HostPostureRow,
};
