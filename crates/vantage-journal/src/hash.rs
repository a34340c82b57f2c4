//! BLAKE3 content hashing for tamper evidence.
//!
//! Computes a deterministic hash of all journal fields (excluding the
//! content_hash itself) so that any modification is detectable.

use serde::Serialize;

use crate::EpisodeJournal;

/// Hashable representation of a journal (excludes content_hash).
#[derive(Serialize)]
struct HashableJournal<'a> {
    id: &'a crate::JournalId,
    episode_id: &'a vantage_core::types::EpisodeId,
    environment: &'a str,
    context: &'a serde_json::Value,
    steps: &'a [crate::StepRecord],
    started_at: &'a chrono::DateTime<chrono::Utc>,
    completed_at: &'a Option<chrono::DateTime<chrono::Utc>>,
}

/// Compute the BLAKE3 hash of a journal's content.
///
/// Serializes all fields except `content_hash` to canonical JSON,
/// then hashes the bytes with BLAKE3. Returns the hex-encoded hash.
pub fn compute_journal_hash(journal: &EpisodeJournal) -> String {
    let hashable = HashableJournal {
        id: &journal.id,
        episode_id: &journal.episode_id,
        environment: &journal.environment,
        context: &journal.context,
        steps: &journal.steps,
        started_at: &journal.started_at,
        completed_at: &journal.completed_at,
    };

    let json = serde_json::to_vec(&hashable).expect("Journal serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
