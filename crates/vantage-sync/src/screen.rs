//! Delta screening: partition an observation delta into entries that can
//! apply and entries referencing hosts the episode never ingested.
//!
//! Screening happens before the write transaction so a single bad entry
//! never poisons the batch; the skipped entries are surfaced in the
//! `DeltaSummary` instead of failing the call.

use std::collections::HashSet;

use serde::Serialize;
use vantage_core::types::{CredentialLeak, HostId, ObservationDelta, OwnedHostReport};

/// Which delta list a skipped entry came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeltaEntry {
    Discovered,
    Owned,
    CredentialLeak,
}

impl DeltaEntry {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaEntry::Discovered => "discovered",
            DeltaEntry::Owned => "owned",
            DeltaEntry::CredentialLeak => "credential_leak",
        }
    }
}

/// A delta entry dropped because it referenced an unknown host.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedEntity {
    pub entry: DeltaEntry,
    /// The host id the episode does not know.
    pub host: HostId,
}

/// An observation delta partitioned into applicable and skipped entries.
#[derive(Debug, Clone, Default)]
pub struct ScreenedDelta {
    pub discovered: Vec<HostId>,
    pub owned: Vec<OwnedHostReport>,
    pub leaked: Vec<CredentialLeak>,
    pub skipped: Vec<SkippedEntity>,
}

/// Screen a delta against the set of host ids known to the episode.
///
/// A credential leak is skipped if either of its endpoint hosts is
/// unknown; the skip records the first unknown endpoint.
pub fn screen_delta(delta: &ObservationDelta, known_hosts: &HashSet<String>) -> ScreenedDelta {
    let mut screened = ScreenedDelta::default();

    for host in &delta.discovered_hosts {
        if known_hosts.contains(host.as_str()) {
            screened.discovered.push(host.clone());
        } else {
            screened.skipped.push(SkippedEntity {
                entry: DeltaEntry::Discovered,
                host: host.clone(),
            });
        }
    }

    for report in &delta.owned_hosts {
        if known_hosts.contains(report.host.as_str()) {
            screened.owned.push(report.clone());
        } else {
            screened.skipped.push(SkippedEntity {
                entry: DeltaEntry::Owned,
                host: report.host.clone(),
            });
        }
    }

    for leak in &delta.leaked_credentials {
        let unknown = [&leak.leaked_from, &leak.valid_for]
            .into_iter()
            .find(|h| !known_hosts.contains(h.as_str()));
        match unknown {
            None => screened.leaked.push(leak.clone()),
            Some(host) => screened.skipped.push(SkippedEntity {
                entry: DeltaEntry::CredentialLeak,
                host: host.clone(),
            }),
        }
    }

    screened
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::types::{CredentialId, CredentialKind, PrivilegeLevel};

    fn known(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn leak(from: &str, to: &str) -> CredentialLeak {
        CredentialLeak {
            credential: CredentialId::new("cred-1"),
            kind: CredentialKind::Password,
            username: None,
            leaked_from: HostId::new(from),
            valid_for: HostId::new(to),
        }
    }

    #[test]
    fn known_entries_pass_through() {
        let delta = ObservationDelta {
            discovered_hosts: vec![HostId::new("web-01")],
            owned_hosts: vec![OwnedHostReport {
                host: HostId::new("db-01"),
                privilege: PrivilegeLevel::User,
            }],
            leaked_credentials: vec![leak("web-01", "db-01")],
        };

        let screened = screen_delta(&delta, &known(&["web-01", "db-01"]));
        assert_eq!(screened.discovered.len(), 1);
        assert_eq!(screened.owned.len(), 1);
        assert_eq!(screened.leaked.len(), 1);
        assert!(screened.skipped.is_empty());
    }

    #[test]
    fn unknown_host_is_skipped_without_affecting_rest() {
        let delta = ObservationDelta {
            discovered_hosts: vec![HostId::new("web-01"), HostId::new("ghost-99")],
            owned_hosts: vec![],
            leaked_credentials: vec![],
        };

        let screened = screen_delta(&delta, &known(&["web-01"]));
        assert_eq!(screened.discovered, vec![HostId::new("web-01")]);
        assert_eq!(screened.skipped.len(), 1);
        assert_eq!(screened.skipped[0].entry, DeltaEntry::Discovered);
        assert_eq!(screened.skipped[0].host, HostId::new("ghost-99"));
    }

    #[test]
    fn leak_with_unknown_endpoint_is_skipped() {
        let delta = ObservationDelta {
            discovered_hosts: vec![],
            owned_hosts: vec![],
            leaked_credentials: vec![leak("web-01", "ghost-99"), leak("web-01", "db-01")],
        };

        let screened = screen_delta(&delta, &known(&["web-01", "db-01"]));
        assert_eq!(screened.leaked.len(), 1);
        assert_eq!(screened.leaked[0].valid_for, HostId::new("db-01"));
        assert_eq!(screened.skipped.len(), 1);
        assert_eq!(screened.skipped[0].entry, DeltaEntry::CredentialLeak);
        assert_eq!(screened.skipped[0].host, HostId::new("ghost-99"));
    }

    #[test]
    fn empty_known_set_skips_everything() {
        let delta = ObservationDelta {
            discovered_hosts: vec![HostId::new("web-01")],
            owned_hosts: vec![OwnedHostReport {
                host: HostId::new("web-01"),
                privilege: PrivilegeLevel::Admin,
            }],
            leaked_credentials: vec![leak("web-01", "web-01")],
        };

        let screened = screen_delta(&delta, &HashSet::new());
        assert!(screened.discovered.is_empty());
        assert!(screened.owned.is_empty());
        assert!(screened.leaked.is_empty());
        assert_eq!(screened.skipped.len(), 3);
    }
}
