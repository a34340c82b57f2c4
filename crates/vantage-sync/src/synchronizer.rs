//! The knowledge synchronizer: ingests topologies and applies observation
//! deltas to an episode partition.
//!
//! This is the single writer for a partition. Each operation validates or
//! screens its input before touching the store, then batches all writes
//! for the call into one transaction.

use serde::Serialize;
use vantage_core::types::{EpisodeId, ObservationDelta, Topology};
use vantage_graph::GraphClient;

use crate::error::{Result, SyncError};
use crate::screen::{self, SkippedEntity};
use crate::validate;

/// Counts from a completed topology ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub hosts: usize,
    pub services: usize,
    pub vulnerabilities: usize,
    pub links: usize,
}

/// Outcome of one applied observation delta.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DeltaSummary {
    /// Hosts marked discovered.
    pub discovered: usize,
    /// Hosts marked owned.
    pub owned: usize,
    /// Credential leaks recorded.
    pub credentials: usize,
    /// Entries dropped because they referenced unknown hosts.
    pub skipped: Vec<SkippedEntity>,
}

/// Writes environment knowledge into the graph, one episode at a time.
pub struct Synchronizer {
    graph: GraphClient,
}

impl Synchronizer {
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }

    /// The underlying graph client, for callers that also read.
    pub fn graph(&self) -> &GraphClient {
        &self.graph
    }

    /// Ingest the static topology for an episode.
    ///
    /// Validates the whole description first; nothing is written on a
    /// schema violation. Idempotent: re-ingesting the same topology
    /// changes no counts and resets no discovery/ownership flags.
    pub async fn ingest_topology(
        &self,
        episode: &EpisodeId,
        topology: &Topology,
    ) -> Result<IngestSummary> {
        validate::validate_topology(topology)?;

        self.graph.upsert_topology(episode, topology).await?;

        let summary = IngestSummary {
            hosts: topology.host_count(),
            services: topology.service_count(),
            vulnerabilities: topology.vulnerability_count(),
            links: topology.links.len(),
        };

        tracing::info!(
            episode_id = %episode,
            hosts = summary.hosts,
            services = summary.services,
            vulnerabilities = summary.vulnerabilities,
            links = summary.links,
            "Topology ingested"
        );

        Ok(summary)
    }

    /// Apply one step's observation delta to the episode.
    ///
    /// Entries referencing hosts the episode never ingested are skipped
    /// and logged; the remaining entries apply in one transaction. Flag
    /// updates are monotonic: nothing here can un-discover, un-own, or
    /// downgrade privilege. Bumps the episode step counter, including for
    /// a delta that ends up empty after screening.
    pub async fn apply_observation_delta(
        &self,
        episode: &EpisodeId,
        delta: &ObservationDelta,
    ) -> Result<DeltaSummary> {
        let known = self.graph.known_host_ids(episode).await?;
        let screened = screen::screen_delta(delta, &known);

        for skip in &screened.skipped {
            let err = SyncError::UnknownEntity {
                kind: "host".to_string(),
                id: skip.host.to_string(),
            };
            tracing::warn!(
                episode_id = %episode,
                entry = skip.entry.as_str(),
                error = %err,
                "Skipping delta entry"
            );
        }

        self.graph
            .apply_delta_updates(episode, &screened.discovered, &screened.owned, &screened.leaked)
            .await?;

        let summary = DeltaSummary {
            discovered: screened.discovered.len(),
            owned: screened.owned.len(),
            credentials: screened.leaked.len(),
            skipped: screened.skipped,
        };

        tracing::debug!(
            episode_id = %episode,
            discovered = summary.discovered,
            owned = summary.owned,
            credentials = summary.credentials,
            skipped = summary.skipped.len(),
            "Observation delta applied"
        );

        Ok(summary)
    }

    /// Clear the episode partition entirely. Returns the number of nodes
    /// deleted.
    pub async fn reset_episode(&self, episode: &EpisodeId) -> Result<i64> {
        let deleted = self.graph.clear_episode(episode).await?;
        tracing::info!(
            episode_id = %episode,
            nodes_deleted = deleted,
            "Episode reset"
        );
        Ok(deleted)
    }
}
