//! Schema bootstrap: lookup indexes for the episode-partitioned graph.
//!
//! Node identity is the composite `(episode_id, id)` key. Uniqueness is
//! guaranteed by upserting through `MERGE` on that key under the
//! single-writer-per-partition model, so the schema layer only has to make
//! the per-step lookups fast: composite indexes per label, plus the two
//! Host flags the mask and feature queries filter on constantly.

use neo4rs::query;

use crate::client::{GraphClient, GraphError};

/// Idempotent schema statements, applied in order.
pub fn schema_statements() -> Vec<&'static str> {
    vec![
        "CREATE INDEX episode_lookup IF NOT EXISTS FOR (e:Episode) ON (e.episode_id)",
        "CREATE INDEX host_lookup IF NOT EXISTS FOR (h:Host) ON (h.episode_id, h.id)",
        "CREATE INDEX service_lookup IF NOT EXISTS FOR (s:Service) ON (s.episode_id, s.id)",
        "CREATE INDEX vulnerability_lookup IF NOT EXISTS FOR (v:Vulnerability) ON (v.episode_id, v.id)",
        "CREATE INDEX credential_lookup IF NOT EXISTS FOR (c:Credential) ON (c.episode_id, c.id)",
        "CREATE INDEX host_discovered IF NOT EXISTS FOR (h:Host) ON (h.episode_id, h.discovered)",
        "CREATE INDEX host_owned IF NOT EXISTS FOR (h:Host) ON (h.episode_id, h.owned)",
    ]
}

impl GraphClient {
    /// Apply all schema statements. Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), GraphError> {
        for statement in schema_statements() {
            self.run(query(statement)).await?;
        }
        tracing::info!(
            statements = schema_statements().len(),
            "Knowledge graph schema ensured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_idempotent_by_construction() {
        for statement in schema_statements() {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }

    #[test]
    fn every_partitioned_label_has_a_lookup_index() {
        let joined = schema_statements().join("\n");
        for label in ["Episode", "Host", "Service", "Vulnerability", "Credential"] {
            assert!(joined.contains(&format!(":{label})")), "{label}");
        }
    }
}
