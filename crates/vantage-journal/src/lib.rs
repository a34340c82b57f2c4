//! vantage-journal: Tamper-evident episode trail.
//!
//! A journal records everything the knowledge layer did during one
//! training episode: topology ingestion, observation deltas, computed
//! masks, extracted features, skipped entities, and the final reset.
//! Each journal is content-hashed with BLAKE3 on finalization and stored
//! as a JSON file, so a finished episode can be audited (or turned into a
//! markdown report) long after its graph partition has been cleared.

pub mod hash;
pub mod recorder;
pub mod report;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vantage_core::types::EpisodeId;

// ── Core Types ───────────────────────────────────────────────────

/// Unique identifier for a journal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JournalId(pub Uuid);

impl JournalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JournalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JournalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One event in the episode trail, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type")]
pub enum StepEvent {
    // ── Synchronizer events ───────────────────────────────────
    /// The static topology was ingested into the episode partition.
    TopologyIngested {
        hosts: usize,
        services: usize,
        vulnerabilities: usize,
        links: usize,
    },
    /// An observation delta was applied.
    DeltaApplied {
        discovered: usize,
        owned: usize,
        credentials: usize,
        skipped: usize,
    },
    /// A delta entry referenced an entity the episode never ingested.
    EntitySkipped { kind: String, id: String },

    // ── Advisor events ────────────────────────────────────────
    /// An action mask was computed.
    MaskComputed { total: usize, valid: usize },
    /// Strategic features were extracted.
    FeaturesExtracted {
        attack_surface: f64,
        pivot_opportunities: f64,
        credential_leverage: f64,
        owned_hosts: f64,
    },

    // ── Lifecycle events ──────────────────────────────────────
    /// The episode partition was cleared.
    EpisodeReset { nodes_deleted: i64 },
}

/// A step event with its position in the episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    /// Episode step counter at the time of the event.
    pub step: i64,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event: StepEvent,
}

/// The complete trail of one episode.
///
/// A journal captures the knowledge layer's side of an episode from
/// ingestion to reset, providing a durable record that outlives the
/// graph partition itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeJournal {
    /// Unique journal identifier.
    pub id: JournalId,
    /// Episode this journal records.
    pub episode_id: EpisodeId,
    /// Environment or scenario label the episode ran against.
    pub environment: String,
    /// Free-form episode metadata (scenario parameters, seeds).
    pub context: serde_json::Value,
    /// Recorded events in order.
    pub steps: Vec<StepRecord>,
    /// When recording started.
    pub started_at: DateTime<Utc>,
    /// When recording ended.
    pub completed_at: Option<DateTime<Utc>>,
    /// BLAKE3 content hash (hex), set on finalization.
    pub content_hash: Option<String>,
}

impl EpisodeJournal {
    /// Compute and return the BLAKE3 hash of the journal's content.
    /// The hash covers all fields except `content_hash` itself.
    pub fn compute_hash(&self) -> String {
        hash::compute_journal_hash(self)
    }

    /// Verify that the stored content_hash matches a freshly computed hash.
    pub fn verify_integrity(&self) -> bool {
        match &self.content_hash {
            Some(stored) => stored == &self.compute_hash(),
            None => false,
        }
    }
}
