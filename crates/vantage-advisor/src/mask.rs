//! Action mask computation.
//!
//! Every template in the action space is checked against one episode
//! snapshot and mapped to a validity bit, in action-space order. The
//! check is a pure fold over the snapshot: no store access, no clock,
//! no randomness, so one graph state always produces one mask.
//!
//! Preconditions per kind:
//! - every kind: the target host is discovered;
//! - `scan`: nothing further;
//! - `remote_exploit`: target not yet owned, an owned source host has a
//!   route to it, the target exposes a matching vulnerability, and a
//!   credential is in hand when the template or the vulnerability
//!   demands one;
//! - `local_exploit`: target owned, matching vulnerability exposed when
//!   a category is given;
//! - `connect`: target owned and routable from an owned source.

use std::fmt;

use vantage_core::actions::{ActionKind, ActionMask, ActionSpace, ActionTemplate};
use vantage_core::types::HostId;
use vantage_graph::{ExposureRow, HostPostureRow};

use crate::error::{AdvisorError, Result};
use crate::snapshot::EpisodeSnapshot;

// ── Verdicts ──────────────────────────────────────────────────────

/// Why a template is currently masked invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    TargetUndiscovered,
    TargetAlreadyOwned,
    TargetNotOwned,
    SourceNotOwned,
    NotReachable,
    NothingToExploit,
    CredentialRequired,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidReason::TargetUndiscovered => "target host is not discovered",
            InvalidReason::TargetAlreadyOwned => "target host is already owned",
            InvalidReason::TargetNotOwned => "target host is not owned",
            InvalidReason::SourceNotOwned => "source host is not owned",
            InvalidReason::NotReachable => "no owned source host has a route to the target",
            InvalidReason::NothingToExploit => {
                "target exposes no vulnerability of the required category"
            }
            InvalidReason::CredentialRequired => {
                "a credential valid for the target is required but not available"
            }
        };
        write!(f, "{text}")
    }
}

/// Validity of one template against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

// ── Mask computation ──────────────────────────────────────────────

/// Evaluate the whole action space against one snapshot, in order.
pub fn compute_mask(snapshot: &EpisodeSnapshot, space: &ActionSpace) -> Result<ActionMask> {
    let mut bits = Vec::with_capacity(space.len());
    for template in space.iter() {
        bits.push(check_template(snapshot, template)?.is_valid());
    }
    Ok(ActionMask::new(bits))
}

/// Evaluate one template.
///
/// `Err` only for schema mismatches (a host or category the episode never
/// ingested); an action that is merely impossible right now comes back
/// `Invalid` with its reason.
pub fn check_template(snapshot: &EpisodeSnapshot, template: &ActionTemplate) -> Result<Validity> {
    let target = ensure_in_schema(snapshot, template)?;

    if !target.discovered {
        return Ok(Validity::Invalid(InvalidReason::TargetUndiscovered));
    }

    let verdict = match template.kind {
        ActionKind::Scan => Validity::Valid,
        ActionKind::RemoteExploit => check_remote_exploit(snapshot, template, target),
        ActionKind::LocalExploit => check_local_exploit(snapshot, template, target),
        ActionKind::Connect => check_connect(snapshot, template, target),
    };
    Ok(verdict)
}

/// Reject templates that reference hosts or categories outside the
/// ingested topology. A host that exists but is undiscovered is NOT a
/// schema mismatch; it masks the action invalid instead.
pub(crate) fn ensure_in_schema<'a>(
    snapshot: &'a EpisodeSnapshot,
    template: &ActionTemplate,
) -> Result<&'a HostPostureRow> {
    let target = match snapshot.posture(template.target.as_str()) {
        Some(posture) => posture,
        None => {
            return Err(AdvisorError::unknown_action(
                template.label(),
                format!("target host {} was never ingested", template.target),
            ));
        }
    };

    if let Some(source) = &template.source {
        if !snapshot.knows_host(source.as_str()) {
            return Err(AdvisorError::unknown_action(
                template.label(),
                format!("source host {source} was never ingested"),
            ));
        }
    }

    if let Some(category) = &template.category {
        if !snapshot.knows_category(category.as_str()) {
            return Err(AdvisorError::unknown_action(
                template.label(),
                format!("exploit category {category} was never ingested"),
            ));
        }
    }

    Ok(target)
}

pub(crate) fn matches_category(exposure: &ExposureRow, category: Option<&str>) -> bool {
    category.map_or(true, |c| exposure.category == c)
}

fn check_remote_exploit(
    snapshot: &EpisodeSnapshot,
    template: &ActionTemplate,
    target: &HostPostureRow,
) -> Validity {
    if target.owned {
        return Validity::Invalid(InvalidReason::TargetAlreadyOwned);
    }

    if let Some(reason) = check_route(snapshot, template.source.as_ref(), &target.id) {
        return Validity::Invalid(reason);
    }

    let has_credential = snapshot.has_credential_for(&target.id);
    if template.requires_credential && !has_credential {
        return Validity::Invalid(InvalidReason::CredentialRequired);
    }

    let category = template.category.as_ref().map(|c| c.as_str());
    let exposures = snapshot.exposures_of(&target.id);
    if !exposures.iter().any(|e| matches_category(e, category)) {
        return Validity::Invalid(InvalidReason::NothingToExploit);
    }

    // An auth-gated vulnerability is only exploitable with a credential
    // in hand; one non-gated match is enough.
    let exploitable = exposures
        .iter()
        .filter(|e| matches_category(e, category))
        .any(|e| !e.requires_auth || has_credential);
    if !exploitable {
        return Validity::Invalid(InvalidReason::CredentialRequired);
    }

    Validity::Valid
}

fn check_local_exploit(
    snapshot: &EpisodeSnapshot,
    template: &ActionTemplate,
    target: &HostPostureRow,
) -> Validity {
    if !target.owned {
        return Validity::Invalid(InvalidReason::TargetNotOwned);
    }

    if template.requires_credential && !snapshot.has_credential_for(&target.id) {
        return Validity::Invalid(InvalidReason::CredentialRequired);
    }

    if let Some(category) = &template.category {
        if !snapshot.exposes_category(&target.id, category.as_str()) {
            return Validity::Invalid(InvalidReason::NothingToExploit);
        }
    }

    Validity::Valid
}

fn check_connect(
    snapshot: &EpisodeSnapshot,
    template: &ActionTemplate,
    target: &HostPostureRow,
) -> Validity {
    if !target.owned {
        return Validity::Invalid(InvalidReason::TargetNotOwned);
    }

    if let Some(reason) = check_route(snapshot, template.source.as_ref(), &target.id) {
        return Validity::Invalid(reason);
    }

    Validity::Valid
}

/// Route check shared by remote exploit and connect: an explicit source
/// must itself be owned and linked to the target; otherwise any owned
/// host with a link qualifies.
fn check_route(
    snapshot: &EpisodeSnapshot,
    source: Option<&HostId>,
    target: &str,
) -> Option<InvalidReason> {
    match source {
        Some(source) => {
            let source_owned = snapshot
                .posture(source.as_str())
                .map_or(false, |p| p.owned);
            if !source_owned {
                return Some(InvalidReason::SourceNotOwned);
            }
            if !snapshot.is_reachable(source.as_str(), target) {
                return Some(InvalidReason::NotReachable);
            }
        }
        None => {
            if !snapshot.reachable_from_owned(target) {
                return Some(InvalidReason::NotReachable);
            }
        }
    }
    None
}
