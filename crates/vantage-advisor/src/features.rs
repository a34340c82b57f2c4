//! Strategic and per-action feature extraction.
//!
//! All functions here are pure folds over an [`EpisodeSnapshot`]; the
//! counts are recomputed from scratch on every call rather than cached.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use vantage_core::actions::ActionTemplate;
use vantage_core::types::PrivilegeLevel;

use crate::error::Result;
use crate::mask::ensure_in_schema;
use crate::snapshot::EpisodeSnapshot;

// ── Episode-level features ────────────────────────────────────────

/// Fixed-order strategic summary of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategicFeatures {
    /// Hosts discovered but not yet owned.
    pub attack_surface: usize,
    /// Owned hosts with a route to at least one non-owned host.
    pub pivot_opportunities: usize,
    /// Distinct non-owned hosts a leaked credential can open.
    pub credential_leverage: usize,
    /// Hosts currently owned.
    pub owned_hosts: usize,
}

impl StrategicFeatures {
    /// `[attack_surface, pivot_opportunities, credential_leverage,
    /// owned_hosts]`, the order the agent is trained against.
    pub fn to_vector(&self) -> [f64; 4] {
        [
            self.attack_surface as f64,
            self.pivot_opportunities as f64,
            self.credential_leverage as f64,
            self.owned_hosts as f64,
        ]
    }
}

pub fn attack_surface(snapshot: &EpisodeSnapshot) -> usize {
    snapshot
        .hosts
        .values()
        .filter(|h| h.discovered && !h.owned)
        .count()
}

pub fn pivot_opportunities(snapshot: &EpisodeSnapshot) -> usize {
    snapshot
        .owned()
        .filter(|h| {
            snapshot
                .neighbors(&h.id)
                .any(|n| snapshot.posture(n).map_or(false, |p| !p.owned))
        })
        .count()
}

pub fn credential_leverage(snapshot: &EpisodeSnapshot) -> usize {
    let unlockable: HashSet<&str> = snapshot
        .credentials
        .iter()
        .filter(|c| snapshot.posture(&c.leaked_from).map_or(false, |p| p.owned))
        .map(|c| c.valid_for.as_str())
        .filter(|target| snapshot.posture(target).map_or(false, |p| !p.owned))
        .collect();
    unlockable.len()
}

pub fn owned_hosts(snapshot: &EpisodeSnapshot) -> usize {
    snapshot.owned().count()
}

/// Compute all four strategic features from one snapshot.
pub fn extract_features(snapshot: &EpisodeSnapshot) -> StrategicFeatures {
    StrategicFeatures {
        attack_surface: attack_surface(snapshot),
        pivot_opportunities: pivot_opportunities(snapshot),
        credential_leverage: credential_leverage(snapshot),
        owned_hosts: owned_hosts(snapshot),
    }
}

// ── Per-action features ───────────────────────────────────────────

/// Fixed-order descriptor of one action template against the current
/// state, fed to the low-level agent alongside the mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionFeatures {
    pub kind_code: f64,
    pub cost: f64,
    pub noise: f64,
    pub requires_credential: f64,
    pub credential_available: f64,
    pub target_value: f64,
    pub target_discovered: f64,
    pub target_owned: f64,
    pub max_cvss: f64,
    pub exposed_vulnerabilities: f64,
}

impl ActionFeatures {
    pub fn to_vector(&self) -> [f64; 10] {
        [
            self.kind_code,
            self.cost,
            self.noise,
            self.requires_credential,
            self.credential_available,
            self.target_value,
            self.target_discovered,
            self.target_owned,
            self.max_cvss,
            self.exposed_vulnerabilities,
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Describe one template against the snapshot.
///
/// Fails exactly like the mask does for templates outside the ingested
/// schema, so feature extraction and masking agree on what exists.
pub fn action_features(
    snapshot: &EpisodeSnapshot,
    template: &ActionTemplate,
) -> Result<ActionFeatures> {
    let target = ensure_in_schema(snapshot, template)?;
    let exposures = snapshot.exposures_of(&target.id);
    let max_cvss = exposures.iter().map(|e| e.cvss).fold(0.0, f64::max);

    Ok(ActionFeatures {
        kind_code: template.kind.code() as f64,
        cost: template.cost,
        noise: template.noise,
        requires_credential: flag(template.requires_credential),
        credential_available: flag(snapshot.has_credential_for(&target.id)),
        target_value: target.value as f64,
        target_discovered: flag(target.discovered),
        target_owned: flag(target.owned),
        max_cvss,
        exposed_vulnerabilities: exposures.len() as f64,
    })
}

// ── Episode phase ─────────────────────────────────────────────────

/// Coarse campaign phase derived from ownership and privilege counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodePhase {
    Reconnaissance,
    InitialAccess,
    LateralMovement,
    PrivilegeEscalation,
}

impl EpisodePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodePhase::Reconnaissance => "reconnaissance",
            EpisodePhase::InitialAccess => "initial_access",
            EpisodePhase::LateralMovement => "lateral_movement",
            EpisodePhase::PrivilegeEscalation => "privilege_escalation",
        }
    }
}

impl fmt::Display for EpisodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify the snapshot into a campaign phase. The furthest phase wins:
/// admin privilege anywhere counts as privilege escalation even when
/// only one host is owned.
pub fn episode_phase(snapshot: &EpisodeSnapshot) -> EpisodePhase {
    let owned = owned_hosts(snapshot);
    let has_admin = snapshot
        .owned()
        .any(|h| h.privilege_rank >= PrivilegeLevel::Admin.rank());

    if has_admin {
        EpisodePhase::PrivilegeEscalation
    } else if owned >= 2 {
        EpisodePhase::LateralMovement
    } else if owned == 1 {
        EpisodePhase::InitialAccess
    } else {
        EpisodePhase::Reconnaissance
    }
}
