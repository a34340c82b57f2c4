//! Action-space vocabulary shared with the decision agent.
//!
//! The agent's action space is a fixed, ordered enumeration of templates;
//! the advisor produces a boolean mask aligned to that order. Templates
//! carry the per-action metadata (cost, noise, credential requirement) the
//! environment defines for its abilities.

use serde::{Deserialize, Serialize};

use crate::types::{ExploitCategory, HostId};

// ── Action templates ──────────────────────────────────────────────

/// What an action template does to its target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Reconnaissance against a discovered host.
    Scan,
    /// Exploit a vulnerability on a reachable host from an owned one.
    RemoteExploit,
    /// Exploit a vulnerability locally on an already-owned host.
    LocalExploit,
    /// Move the agent's focus onto an owned, reachable host.
    Connect,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Scan => "scan",
            ActionKind::RemoteExploit => "remote_exploit",
            ActionKind::LocalExploit => "local_exploit",
            ActionKind::Connect => "connect",
        }
    }

    /// Stable numeric code used in per-action feature vectors.
    pub fn code(&self) -> i64 {
        match self {
            ActionKind::Scan => 0,
            ActionKind::RemoteExploit => 1,
            ActionKind::LocalExploit => 2,
            ActionKind::Connect => 3,
        }
    }
}

fn default_cost() -> f64 {
    1.0
}

/// One entry in the fixed action space: "do `kind` to `target`", with the
/// preconditions and metadata the mask and feature computations need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionTemplate {
    pub kind: ActionKind,
    pub target: HostId,
    /// Explicit source host; when absent, any owned host qualifies.
    #[serde(default)]
    pub source: Option<HostId>,
    /// Exploit category the action uses; required in spirit for exploit
    /// kinds, ignored for scan/connect.
    #[serde(default)]
    pub category: Option<ExploitCategory>,
    /// The action only works with a credential valid for the target.
    #[serde(default)]
    pub requires_credential: bool,
    #[serde(default = "default_cost")]
    pub cost: f64,
    #[serde(default)]
    pub noise: f64,
}

impl ActionTemplate {
    /// Compact identifier used in logs, explanations, and errors.
    pub fn label(&self) -> String {
        match &self.category {
            Some(category) => format!("{}:{}:{}", self.kind.as_str(), category, self.target),
            None => format!("{}:{}", self.kind.as_str(), self.target),
        }
    }
}

/// The fixed, ordered action space the mask is computed over.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ActionSpace {
    pub templates: Vec<ActionTemplate>,
}

impl ActionSpace {
    pub fn new(templates: Vec<ActionTemplate>) -> Self {
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionTemplate> {
        self.templates.iter()
    }
}

// ── Action mask ───────────────────────────────────────────────────

/// Boolean validity vector aligned to an [`ActionSpace`] enumeration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionMask {
    pub bits: Vec<bool>,
}

impl ActionMask {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-valid fallback mask.
    ///
    /// The advisor never substitutes this on its own; it exists for callers
    /// that choose to degrade when the graph store is unreachable instead
    /// of aborting the episode.
    pub fn permissive(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Out-of-range indices are invalid rather than a panic.
    pub fn is_valid(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    pub fn valid_count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// 0.0/1.0 form for RL frameworks that multiply masks into logits.
    pub fn to_f32(&self) -> Vec<f32> {
        self.bits.iter().map(|b| if *b { 1.0 } else { 0.0 }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(kind: ActionKind, target: &str) -> ActionTemplate {
        ActionTemplate {
            kind,
            target: HostId::new(target),
            source: None,
            category: None,
            requires_credential: false,
            cost: 1.0,
            noise: 0.0,
        }
    }

    #[test]
    fn action_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ActionKind::RemoteExploit).unwrap();
        assert_eq!(json, "\"remote_exploit\"");
    }

    #[test]
    fn template_label_includes_category_when_present() {
        let mut t = template(ActionKind::Scan, "web-01");
        assert_eq!(t.label(), "scan:web-01");

        t.kind = ActionKind::RemoteExploit;
        t.category = Some(ExploitCategory::new("rce"));
        assert_eq!(t.label(), "remote_exploit:rce:web-01");
    }

    #[test]
    fn template_deserializes_with_defaults() {
        let t: ActionTemplate =
            serde_json::from_str(r#"{"kind": "scan", "target": "web-01"}"#).unwrap();
        assert_eq!(t.cost, 1.0);
        assert_eq!(t.noise, 0.0);
        assert!(t.source.is_none());
        assert!(!t.requires_credential);
    }

    #[test]
    fn permissive_mask_allows_everything() {
        let mask = ActionMask::permissive(4);
        assert_eq!(mask.len(), 4);
        assert_eq!(mask.valid_count(), 4);
        assert!(mask.is_valid(3));
        assert!(!mask.is_valid(4));
    }

    #[test]
    fn mask_converts_to_f32() {
        let mask = ActionMask::new(vec![true, false, true]);
        assert_eq!(mask.to_f32(), vec![1.0, 0.0, 1.0]);
        assert_eq!(mask.valid_count(), 2);
    }
}
