//! vantage-advisor: Action masking and strategic features over the
//! episode knowledge graph.
//!
//! The advisor is the read side of the graph: it fetches one consistent
//! snapshot of an episode partition (snapshot → mask / features / phase /
//! explanations, all folded in memory). It never writes; the synchronizer
//! owns all mutation.

pub mod error;
pub mod explain;
pub mod features;
pub mod fetch;
pub mod mask;
pub mod snapshot;

pub use error::{AdvisorError, Result};
pub use explain::ActionAssessment;
pub use features::{ActionFeatures, EpisodePhase, StrategicFeatures};
pub use mask::{InvalidReason, Validity};
pub use snapshot::EpisodeSnapshot;

use vantage_core::actions::{ActionMask, ActionSpace, ActionTemplate};
use vantage_core::types::EpisodeId;
use vantage_graph::GraphClient;

/// Per-step bundle handed to the agent boundary. Everything in it comes
/// from one snapshot, so mask and features describe the same state.
#[derive(Debug, Clone)]
pub struct StepAdvice {
    pub step: i64,
    pub mask: ActionMask,
    pub features: StrategicFeatures,
    pub phase: EpisodePhase,
}

/// The read-side engine over the knowledge graph.
///
/// Owns a [`GraphClient`] handle; every operation takes the episode
/// partition key explicitly so parallel episodes never mix.
pub struct Advisor {
    graph: GraphClient,
}

impl Advisor {
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &GraphClient {
        &self.graph
    }

    /// Fetch one consistent snapshot of the episode partition.
    ///
    /// Fails with `NotInitialized` while the partition is EMPTY.
    pub async fn snapshot(&self, episode: &EpisodeId) -> Result<EpisodeSnapshot> {
        fetch::fetch_episode_snapshot(&self.graph, episode).await
    }

    /// Compute the validity mask for the whole action space.
    pub async fn compute_mask(
        &self,
        episode: &EpisodeId,
        space: &ActionSpace,
    ) -> Result<ActionMask> {
        let snapshot = self.snapshot(episode).await?;
        let mask = mask::compute_mask(&snapshot, space)?;
        tracing::debug!(
            episode_id = %episode,
            step = snapshot.step,
            total = mask.len(),
            valid = mask.valid_count(),
            "Computed action mask"
        );
        Ok(mask)
    }

    /// Compute the four-feature strategic vector.
    pub async fn extract_features(&self, episode: &EpisodeId) -> Result<StrategicFeatures> {
        Ok(features::extract_features(&self.snapshot(episode).await?))
    }

    /// Count of hosts discovered but not yet owned.
    pub async fn attack_surface(&self, episode: &EpisodeId) -> Result<usize> {
        Ok(features::attack_surface(&self.snapshot(episode).await?))
    }

    /// Count of owned hosts with a route to a non-owned host.
    pub async fn pivot_opportunities(&self, episode: &EpisodeId) -> Result<usize> {
        Ok(features::pivot_opportunities(&self.snapshot(episode).await?))
    }

    /// Count of distinct non-owned hosts a leaked credential can open.
    pub async fn credential_leverage(&self, episode: &EpisodeId) -> Result<usize> {
        Ok(features::credential_leverage(&self.snapshot(episode).await?))
    }

    /// Per-action descriptor for one template.
    pub async fn action_features(
        &self,
        episode: &EpisodeId,
        template: &ActionTemplate,
    ) -> Result<ActionFeatures> {
        let snapshot = self.snapshot(episode).await?;
        features::action_features(&snapshot, template)
    }

    /// Current campaign phase of the episode.
    pub async fn episode_phase(&self, episode: &EpisodeId) -> Result<EpisodePhase> {
        Ok(features::episode_phase(&self.snapshot(episode).await?))
    }

    /// Mask, features, and phase from one snapshot, for one step.
    ///
    /// Orchestrates: fetch snapshot → mask → features → phase. The step
    /// counter in the result is the marker value the snapshot saw, which
    /// ties the advice to the delta that preceded it.
    pub async fn step_advice(&self, episode: &EpisodeId, space: &ActionSpace) -> Result<StepAdvice> {
        let snapshot = self.snapshot(episode).await?;
        let advice = StepAdvice {
            step: snapshot.step,
            mask: mask::compute_mask(&snapshot, space)?,
            features: features::extract_features(&snapshot),
            phase: features::episode_phase(&snapshot),
        };
        tracing::info!(
            episode_id = %episode,
            step = advice.step,
            phase = %advice.phase,
            valid_actions = advice.mask.valid_count(),
            attack_surface = advice.features.attack_surface,
            "Prepared step advice"
        );
        Ok(advice)
    }

    /// Assess every template with reasons and exploit paths.
    pub async fn explain(
        &self,
        episode: &EpisodeId,
        space: &ActionSpace,
    ) -> Result<Vec<ActionAssessment>> {
        let snapshot = self.snapshot(episode).await?;
        explain::explain_space(&snapshot, space)
    }
}
