//! Read operations for the knowledge graph.
//!
//! Everything the advisor folds over comes out of these queries: flat row
//! structs, decoded leniently (missing properties become defaults), scoped
//! to one episode partition per call.

use std::collections::HashSet;

use neo4rs::query;

use vantage_core::types::EpisodeId;

use crate::client::{GraphClient, GraphError};

/// The Episode marker node, written by topology ingestion.
/// Its absence means the partition is EMPTY.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EpisodeMarker {
    pub step: i64,
    pub ingested_at: String,
    pub host_count: i64,
    pub service_count: i64,
    pub vulnerability_count: i64,
}

/// Current posture of one Host node.
#[derive(Debug, Clone)]
pub struct HostPostureRow {
    pub id: String,
    pub os: String,
    pub value: i64,
    pub discovered: bool,
    pub owned: bool,
    pub privilege_rank: i64,
}

/// One `Host -RUNS-> Service -EXPOSES-> Vulnerability` path.
#[derive(Debug, Clone)]
pub struct ExposureRow {
    pub host_id: String,
    pub service_name: String,
    pub vuln_id: String,
    pub category: String,
    pub cvss: f64,
    pub requires_auth: bool,
}

/// One credential with its leak provenance and usable target.
#[derive(Debug, Clone)]
pub struct CredentialAccessRow {
    pub credential_id: String,
    pub kind: String,
    pub leaked_from: String,
    pub valid_for: String,
}

/// Per-label node counts for one episode partition.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GraphStats {
    pub hosts: i64,
    pub services: i64,
    pub vulnerabilities: i64,
    pub credentials: i64,
    pub discovered_hosts: i64,
    pub owned_hosts: i64,
}

impl GraphClient {
    // ── Episode marker ───────────────────────────────────────────

    /// Fetch the Episode marker, if ingestion has happened.
    pub async fn episode_marker(
        &self,
        episode: &EpisodeId,
    ) -> Result<Option<EpisodeMarker>, GraphError> {
        let q = query(
            "MATCH (e:Episode {episode_id: $episode_id})
             RETURN e.step AS step, e.ingested_at AS ingested_at,
                    e.host_count AS host_count, e.service_count AS service_count,
                    e.vulnerability_count AS vulnerability_count",
        )
        .param("episode_id", episode.to_string());

        Ok(self.query_one(q).await?.map(|row| EpisodeMarker {
            step: row.get::<i64>("step").unwrap_or(0),
            ingested_at: row.get::<String>("ingested_at").unwrap_or_default(),
            host_count: row.get::<i64>("host_count").unwrap_or(0),
            service_count: row.get::<i64>("service_count").unwrap_or(0),
            vulnerability_count: row.get::<i64>("vulnerability_count").unwrap_or(0),
        }))
    }

    // ── Snapshot rows ────────────────────────────────────────────

    /// All Host ids currently in the partition. The synchronizer screens
    /// delta entries against this set before writing.
    pub async fn known_host_ids(
        &self,
        episode: &EpisodeId,
    ) -> Result<HashSet<String>, GraphError> {
        let q = query("MATCH (h:Host {episode_id: $episode_id}) RETURN h.id AS id")
            .param("episode_id", episode.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get::<String>("id").unwrap_or_default())
            .collect())
    }

    /// Posture of every Host in the partition.
    pub async fn host_postures(
        &self,
        episode: &EpisodeId,
    ) -> Result<Vec<HostPostureRow>, GraphError> {
        let q = query(
            "MATCH (h:Host {episode_id: $episode_id})
             RETURN h.id AS id, h.os AS os, h.value AS value,
                    h.discovered AS discovered, h.owned AS owned,
                    h.privilege_rank AS privilege_rank
             ORDER BY h.id",
        )
        .param("episode_id", episode.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| HostPostureRow {
                id: row.get::<String>("id").unwrap_or_default(),
                os: row.get::<String>("os").unwrap_or_default(),
                value: row.get::<i64>("value").unwrap_or(0),
                discovered: row.get::<bool>("discovered").unwrap_or(false),
                owned: row.get::<bool>("owned").unwrap_or(false),
                privilege_rank: row.get::<i64>("privilege_rank").unwrap_or(0),
            })
            .collect())
    }

    /// All directed CONNECTED_TO pairs in the partition.
    pub async fn reachability_pairs(
        &self,
        episode: &EpisodeId,
    ) -> Result<Vec<(String, String)>, GraphError> {
        let q = query(
            "MATCH (a:Host {episode_id: $episode_id})-[:CONNECTED_TO]->(b:Host {episode_id: $episode_id})
             RETURN a.id AS from_id, b.id AS to_id",
        )
        .param("episode_id", episode.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get::<String>("from_id").unwrap_or_default(),
                    row.get::<String>("to_id").unwrap_or_default(),
                )
            })
            .collect())
    }

    /// Every Host → Service → Vulnerability exposure path in the partition.
    pub async fn exposure_rows(
        &self,
        episode: &EpisodeId,
    ) -> Result<Vec<ExposureRow>, GraphError> {
        let q = query(
            "MATCH (h:Host {episode_id: $episode_id})-[:RUNS]->(s:Service)-[:EXPOSES]->(v:Vulnerability)
             RETURN h.id AS host_id, s.name AS service_name, v.id AS vuln_id,
                    v.category AS category, v.cvss AS cvss,
                    v.requires_auth AS requires_auth",
        )
        .param("episode_id", episode.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| ExposureRow {
                host_id: row.get::<String>("host_id").unwrap_or_default(),
                service_name: row.get::<String>("service_name").unwrap_or_default(),
                vuln_id: row.get::<String>("vuln_id").unwrap_or_default(),
                category: row.get::<String>("category").unwrap_or_default(),
                cvss: row.get::<f64>("cvss").unwrap_or(0.0),
                requires_auth: row.get::<bool>("requires_auth").unwrap_or(false),
            })
            .collect())
    }

    /// Every credential with its leak source and usable target.
    pub async fn credential_access_rows(
        &self,
        episode: &EpisodeId,
    ) -> Result<Vec<CredentialAccessRow>, GraphError> {
        let q = query(
            "MATCH (src:Host {episode_id: $episode_id})<-[:LEAKED_FROM]-(c:Credential)-[:VALID_FOR]->(t:Host {episode_id: $episode_id})
             RETURN c.id AS credential_id, c.kind AS kind,
                    src.id AS leaked_from, t.id AS valid_for",
        )
        .param("episode_id", episode.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .into_iter()
            .map(|row| CredentialAccessRow {
                credential_id: row.get::<String>("credential_id").unwrap_or_default(),
                kind: row.get::<String>("kind").unwrap_or_default(),
                leaked_from: row.get::<String>("leaked_from").unwrap_or_default(),
                valid_for: row.get::<String>("valid_for").unwrap_or_default(),
            })
            .collect())
    }

    // ── Stats ────────────────────────────────────────────────────

    /// Node counts per label plus discovered/owned host counts.
    pub async fn graph_stats(&self, episode: &EpisodeId) -> Result<GraphStats, GraphError> {
        Ok(GraphStats {
            hosts: self.count_label(episode, "Host").await?,
            services: self.count_label(episode, "Service").await?,
            vulnerabilities: self.count_label(episode, "Vulnerability").await?,
            credentials: self.count_label(episode, "Credential").await?,
            discovered_hosts: self.count_host_flag(episode, "discovered").await?,
            owned_hosts: self.count_host_flag(episode, "owned").await?,
        })
    }

    /// Count nodes of a given label in the partition.
    pub async fn count_label(
        &self,
        episode: &EpisodeId,
        label: &str,
    ) -> Result<i64, GraphError> {
        let cypher = format!(
            "MATCH (n:{label} {{episode_id: $episode_id}})
             RETURN count(n) AS cnt"
        );
        let q = query(&cypher).param("episode_id", episode.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }

    async fn count_host_flag(
        &self,
        episode: &EpisodeId,
        flag: &str,
    ) -> Result<i64, GraphError> {
        let cypher = format!(
            "MATCH (h:Host {{episode_id: $episode_id}})
             WHERE h.{flag} = true
             RETURN count(h) AS cnt"
        );
        let q = query(&cypher).param("episode_id", episode.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }
}
