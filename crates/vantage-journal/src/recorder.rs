//! Builder-pattern recorder for episode journals.
//!
//! Used by the driving caller to incrementally record the knowledge
//! layer's activity during an episode:
//!
//! ```no_run
//! # use vantage_journal::recorder::JournalRecorder;
//! # use vantage_core::types::EpisodeId;
//! let episode = EpisodeId::new();
//! let mut recorder = JournalRecorder::new(&episode, "chain-6");
//! recorder.set_context(serde_json::json!({"hosts": 6, "seed": 42}));
//! recorder.record_topology_ingested(0, 6, 8, 5, 5);
//! recorder.record_delta_applied(1, 1, 1, 0, 0);
//! recorder.record_mask_computed(1, 24, 3);
//! let journal = recorder.finalize();
//! assert!(journal.content_hash.is_some());
//! ```

use chrono::Utc;
use vantage_core::types::EpisodeId;

use crate::{EpisodeJournal, JournalId, StepEvent, StepRecord};

/// Records an episode's events incrementally.
pub struct JournalRecorder {
    journal: EpisodeJournal,
}

impl JournalRecorder {
    /// Start recording a new episode trail.
    pub fn new(episode_id: &EpisodeId, environment: &str) -> Self {
        Self {
            journal: EpisodeJournal {
                id: JournalId::new(),
                episode_id: episode_id.clone(),
                environment: environment.to_string(),
                context: serde_json::Value::Null,
                steps: Vec::new(),
                started_at: Utc::now(),
                completed_at: None,
                content_hash: None,
            },
        }
    }

    /// Set free-form episode metadata.
    pub fn set_context(&mut self, context: serde_json::Value) {
        self.journal.context = context;
    }

    /// Record a topology ingestion.
    pub fn record_topology_ingested(
        &mut self,
        step: i64,
        hosts: usize,
        services: usize,
        vulnerabilities: usize,
        links: usize,
    ) {
        self.push(
            step,
            StepEvent::TopologyIngested {
                hosts,
                services,
                vulnerabilities,
                links,
            },
        );
    }

    /// Record an applied observation delta.
    pub fn record_delta_applied(
        &mut self,
        step: i64,
        discovered: usize,
        owned: usize,
        credentials: usize,
        skipped: usize,
    ) {
        self.push(
            step,
            StepEvent::DeltaApplied {
                discovered,
                owned,
                credentials,
                skipped,
            },
        );
    }

    /// Record a delta entry that referenced an unknown entity.
    pub fn record_entity_skipped(&mut self, step: i64, kind: &str, id: &str) {
        self.push(
            step,
            StepEvent::EntitySkipped {
                kind: kind.to_string(),
                id: id.to_string(),
            },
        );
    }

    /// Record a computed action mask.
    pub fn record_mask_computed(&mut self, step: i64, total: usize, valid: usize) {
        self.push(step, StepEvent::MaskComputed { total, valid });
    }

    /// Record an extracted strategic feature vector.
    pub fn record_features_extracted(
        &mut self,
        step: i64,
        attack_surface: f64,
        pivot_opportunities: f64,
        credential_leverage: f64,
        owned_hosts: f64,
    ) {
        self.push(
            step,
            StepEvent::FeaturesExtracted {
                attack_surface,
                pivot_opportunities,
                credential_leverage,
                owned_hosts,
            },
        );
    }

    /// Record the episode partition being cleared.
    pub fn record_episode_reset(&mut self, step: i64, nodes_deleted: i64) {
        self.push(step, StepEvent::EpisodeReset { nodes_deleted });
    }

    /// The journal ID (available before finalization).
    pub fn id(&self) -> JournalId {
        self.journal.id
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.journal.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.steps.is_empty()
    }

    /// Finalize the journal: set completed_at and compute the content hash.
    pub fn finalize(mut self) -> EpisodeJournal {
        self.journal.completed_at = Some(Utc::now());
        let hash = self.journal.compute_hash();
        self.journal.content_hash = Some(hash);
        self.journal
    }

    fn push(&mut self, step: i64, event: StepEvent) {
        self.journal.steps.push(StepRecord {
            step,
            timestamp: Utc::now(),
            event,
        });
    }
}
