//! Human-readable action assessments.
//!
//! Reuses the exact precondition evaluator behind the mask, so an
//! explanation can never disagree with the bit the agent saw. Used by
//! episode reports and the CLI, never on the training hot path.

use std::cmp::Ordering;

use serde::Serialize;

use vantage_core::actions::{ActionKind, ActionSpace, ActionTemplate};

use crate::error::Result;
use crate::mask::{check_template, matches_category, Validity};
use crate::snapshot::EpisodeSnapshot;

/// One template's verdict, phrased for operators.
#[derive(Debug, Clone, Serialize)]
pub struct ActionAssessment {
    pub label: String,
    pub valid: bool,
    /// Why the action is blocked; `None` when valid.
    pub blocked_by: Option<String>,
    /// Exploit path backing the action when the target exposes a matching
    /// vulnerability: `host -> service -> vulnerability (CVSS n.n)`.
    pub exploit_path: Option<String>,
}

/// Assess one template against the snapshot.
pub fn explain_action(
    snapshot: &EpisodeSnapshot,
    template: &ActionTemplate,
) -> Result<ActionAssessment> {
    let verdict = check_template(snapshot, template)?;

    let blocked_by = match verdict {
        Validity::Valid => None,
        Validity::Invalid(reason) => Some(reason.to_string()),
    };

    Ok(ActionAssessment {
        label: template.label(),
        valid: verdict.is_valid(),
        blocked_by,
        exploit_path: exploit_path(snapshot, template),
    })
}

/// Assess every template, in action-space order.
pub fn explain_space(
    snapshot: &EpisodeSnapshot,
    space: &ActionSpace,
) -> Result<Vec<ActionAssessment>> {
    space
        .iter()
        .map(|template| explain_action(snapshot, template))
        .collect()
}

/// Highest-CVSS exposure on the target matching the template's category.
/// Only exploit kinds carry a path.
fn exploit_path(snapshot: &EpisodeSnapshot, template: &ActionTemplate) -> Option<String> {
    if !matches!(
        template.kind,
        ActionKind::RemoteExploit | ActionKind::LocalExploit
    ) {
        return None;
    }

    let category = template.category.as_ref().map(|c| c.as_str());
    let best = snapshot
        .exposures_of(template.target.as_str())
        .iter()
        .filter(|e| matches_category(e, category))
        .max_by(|a, b| a.cvss.partial_cmp(&b.cvss).unwrap_or(Ordering::Equal))?;

    Some(format!(
        "{} -> {} -> {} (CVSS {:.1})",
        best.host_id, best.service_name, best.vuln_id, best.cvss
    ))
}
