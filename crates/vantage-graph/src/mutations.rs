//! Write operations for the knowledge graph.
//!
//! All mutations use MERGE (upsert) semantics so re-ingesting a topology or
//! re-applying a delta never duplicates nodes or edges. Nodes are identified
//! by (episode_id, id). Host flags are monotonic within an episode: the
//! statements here only ever set `discovered`/`owned` to true, and privilege
//! moves up through a rank-guarded CASE, never down, regardless of what the
//! upstream observation claims.

use chrono::Utc;
use neo4rs::{query, Query};

use vantage_core::types::{
    CredentialLeak, EdgeKind, EpisodeId, HostId, HostSpec, OwnedHostReport, ServiceId, Topology,
};

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    // ── Topology ingestion ───────────────────────────────────────

    /// Upsert an entire topology in one transaction: every Host, Service,
    /// and Vulnerability node first, then every relationship, then the
    /// Episode marker. Idempotent.
    ///
    /// Input is assumed validated (the synchronizer rejects topologies with
    /// dangling link endpoints or duplicate identifiers before any write).
    pub async fn upsert_topology(
        &self,
        episode: &EpisodeId,
        topology: &Topology,
    ) -> Result<(), GraphError> {
        let now = Utc::now().to_rfc3339();
        let mut txn = self.start_txn().await?;

        // Nodes before relationships.
        for host in &topology.hosts {
            txn.run(upsert_host_query(episode, host, &now)).await?;

            for svc in &host.services {
                let service_id = ServiceId::derived(&host.id, &svc.name);
                txn.run(
                    query(
                        "MERGE (n:Service {episode_id: $episode_id, id: $id})
                         ON CREATE SET
                           n.name = $name, n.port = $port, n.version = $version,
                           n.host_id = $host_id, n.first_seen = $now
                         ON MATCH SET
                           n.name = $name, n.port = $port, n.version = $version",
                    )
                    .param("episode_id", episode.to_string())
                    .param("id", service_id.0.clone())
                    .param("name", svc.name.clone())
                    .param("port", svc.port.map(i64::from).unwrap_or(0))
                    .param("version", svc.version.clone().unwrap_or_default())
                    .param("host_id", host.id.0.clone())
                    .param("now", now.clone()),
                )
                .await?;

                for vuln in &svc.vulnerabilities {
                    txn.run(
                        query(
                            "MERGE (n:Vulnerability {episode_id: $episode_id, id: $id})
                             ON CREATE SET
                               n.category = $category, n.cvss = $cvss,
                               n.requires_auth = $requires_auth, n.first_seen = $now
                             ON MATCH SET
                               n.category = $category, n.cvss = $cvss,
                               n.requires_auth = $requires_auth",
                        )
                        .param("episode_id", episode.to_string())
                        .param("id", vuln.id.0.clone())
                        .param("category", vuln.category.0.clone())
                        .param("cvss", vuln.cvss)
                        .param("requires_auth", vuln.requires_auth)
                        .param("now", now.clone()),
                    )
                    .await?;
                }
            }
        }

        for host in &topology.hosts {
            for svc in &host.services {
                let service_id = ServiceId::derived(&host.id, &svc.name);
                txn.run(upsert_edge_query(
                    episode,
                    "Host",
                    host.id.as_str(),
                    "Service",
                    service_id.as_str(),
                    EdgeKind::Runs,
                ))
                .await?;

                for vuln in &svc.vulnerabilities {
                    txn.run(upsert_edge_query(
                        episode,
                        "Service",
                        service_id.as_str(),
                        "Vulnerability",
                        vuln.id.as_str(),
                        EdgeKind::Exposes,
                    ))
                    .await?;
                }
            }
        }

        for link in &topology.links {
            txn.run(upsert_edge_query(
                episode,
                "Host",
                link.from.as_str(),
                "Host",
                link.to.as_str(),
                EdgeKind::ConnectedTo,
            ))
            .await?;
        }

        txn.run(
            query(
                "MERGE (e:Episode {episode_id: $episode_id})
                 ON CREATE SET e.step = 0, e.ingested_at = $now
                 SET e.host_count = $hosts, e.service_count = $services,
                     e.vulnerability_count = $vulnerabilities, e.updated_at = $now",
            )
            .param("episode_id", episode.to_string())
            .param("hosts", topology.host_count() as i64)
            .param("services", topology.service_count() as i64)
            .param("vulnerabilities", topology.vulnerability_count() as i64)
            .param("now", now.clone()),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    // ── Observation deltas ───────────────────────────────────────

    /// Apply a pre-screened observation delta in one transaction and bump
    /// the Episode step counter.
    ///
    /// Every entry must reference hosts known to the episode; the
    /// synchronizer screens entries against `known_host_ids` first, so a
    /// silently no-opping MATCH here would indicate a bug, not bad input.
    pub async fn apply_delta_updates(
        &self,
        episode: &EpisodeId,
        discovered: &[HostId],
        owned: &[OwnedHostReport],
        leaked: &[CredentialLeak],
    ) -> Result<(), GraphError> {
        let now = Utc::now().to_rfc3339();
        let mut txn = self.start_txn().await?;

        for host in discovered {
            txn.run(
                query(
                    "MATCH (h:Host {episode_id: $episode_id, id: $id})
                     SET h.discovered = true, h.last_seen = $now",
                )
                .param("episode_id", episode.to_string())
                .param("id", host.0.clone())
                .param("now", now.clone()),
            )
            .await?;
        }

        for report in owned {
            // Owned implies discovered; privilege only ever moves up.
            txn.run(
                query(
                    "MATCH (h:Host {episode_id: $episode_id, id: $id})
                     SET h.discovered = true, h.owned = true,
                         h.privilege = CASE WHEN h.privilege_rank >= $rank
                                            THEN h.privilege ELSE $privilege END,
                         h.privilege_rank = CASE WHEN h.privilege_rank >= $rank
                                                 THEN h.privilege_rank ELSE $rank END,
                         h.last_seen = $now",
                )
                .param("episode_id", episode.to_string())
                .param("id", report.host.0.clone())
                .param("privilege", report.privilege.as_str().to_string())
                .param("rank", report.privilege.rank())
                .param("now", now.clone()),
            )
            .await?;
        }

        for leak in leaked {
            txn.run(
                query(
                    "MERGE (c:Credential {episode_id: $episode_id, id: $id})
                     ON CREATE SET
                       c.kind = $kind, c.username = $username, c.first_seen = $now",
                )
                .param("episode_id", episode.to_string())
                .param("id", leak.credential.0.clone())
                .param("kind", leak.kind.as_str().to_string())
                .param("username", leak.username.clone().unwrap_or_default())
                .param("now", now.clone()),
            )
            .await?;

            txn.run(upsert_edge_query(
                episode,
                "Credential",
                leak.credential.as_str(),
                "Host",
                leak.leaked_from.as_str(),
                EdgeKind::LeakedFrom,
            ))
            .await?;

            txn.run(upsert_edge_query(
                episode,
                "Credential",
                leak.credential.as_str(),
                "Host",
                leak.valid_for.as_str(),
                EdgeKind::ValidFor,
            ))
            .await?;
        }

        txn.run(
            query(
                "MATCH (e:Episode {episode_id: $episode_id})
                 SET e.step = e.step + 1, e.updated_at = $now",
            )
            .param("episode_id", episode.to_string())
            .param("now", now),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    // ── Episode reset ────────────────────────────────────────────

    /// Detach-delete everything in one episode partition, marker included.
    /// Returns the number of deleted nodes. Other partitions are untouched.
    pub async fn clear_episode(&self, episode: &EpisodeId) -> Result<i64, GraphError> {
        let q = query(
            "MATCH (n {episode_id: $episode_id})
             DETACH DELETE n
             RETURN count(n) AS cnt",
        )
        .param("episode_id", episode.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }
}

// ── Query builders ───────────────────────────────────────────────

fn upsert_host_query(episode: &EpisodeId, host: &HostSpec, now: &str) -> Query {
    // Flags are set only ON CREATE: re-ingesting a topology mid-episode
    // must not reset what the agent has already discovered or owned.
    query(
        "MERGE (n:Host {episode_id: $episode_id, id: $id})
         ON CREATE SET
           n.os = $os, n.value = $value,
           n.discovered = false, n.owned = false,
           n.privilege = 'none', n.privilege_rank = 0,
           n.first_seen = $now, n.last_seen = $now
         ON MATCH SET
           n.os = $os, n.value = $value, n.last_seen = $now",
    )
    .param("episode_id", episode.to_string())
    .param("id", host.id.0.clone())
    .param("os", host.os.clone().unwrap_or_default())
    .param("value", host.value)
    .param("now", now.to_string())
}

/// MATCH both endpoints by (episode_id, id), then MERGE the relationship.
/// Merging on the bare pattern keeps edges idempotent without edge ids.
fn upsert_edge_query(
    episode: &EpisodeId,
    source_label: &str,
    source_id: &str,
    target_label: &str,
    target_id: &str,
    kind: EdgeKind,
) -> Query {
    let rel_type = edge_kind_to_cypher(kind);
    let cypher = format!(
        "MATCH (a:{source_label} {{episode_id: $episode_id, id: $source_id}})
         MATCH (b:{target_label} {{episode_id: $episode_id, id: $target_id}})
         MERGE (a)-[r:{rel_type}]->(b)"
    );

    query(&cypher)
        .param("episode_id", episode.to_string())
        .param("source_id", source_id.to_string())
        .param("target_id", target_id.to_string())
}

/// Convert EdgeKind to its Cypher relationship type string.
fn edge_kind_to_cypher(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::ConnectedTo => "CONNECTED_TO",
        EdgeKind::Runs => "RUNS",
        EdgeKind::Exposes => "EXPOSES",
        EdgeKind::LeakedFrom => "LEAKED_FROM",
        EdgeKind::ValidFor => "VALID_FOR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kinds_map_to_expected_rel_types() {
        assert_eq!(edge_kind_to_cypher(EdgeKind::ConnectedTo), "CONNECTED_TO");
        assert_eq!(edge_kind_to_cypher(EdgeKind::Runs), "RUNS");
        assert_eq!(edge_kind_to_cypher(EdgeKind::Exposes), "EXPOSES");
        assert_eq!(edge_kind_to_cypher(EdgeKind::LeakedFrom), "LEAKED_FROM");
        assert_eq!(edge_kind_to_cypher(EdgeKind::ValidFor), "VALID_FOR");
    }
}
