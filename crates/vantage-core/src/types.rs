//! Core domain types for the Vantage knowledge graph.
//!
//! These types form the contract between the environment adapter and the
//! knowledge layer: the static topology ingested at episode start, the
//! per-step observation deltas, and the vocabulary of graph entities the
//! synchronizer and advisor agree on.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Episode ───────────────────────────────────────────────────────

/// Every node in the graph belongs to exactly one episode partition.
///
/// Parallel training environments each get their own id; all reads and
/// writes are keyed on it so partitions never interleave.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EpisodeId(pub Uuid);

impl EpisodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Entity identifiers ────────────────────────────────────────────

/// Host identifier as assigned by the environment adapter (e.g. `web-01`).
/// Unique per episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Service identifier, derived as `host:name` so it stays unique across
/// hosts running the same service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ServiceId(pub String);

impl ServiceId {
    pub fn derived(host: &HostId, service_name: &str) -> Self {
        Self(format!("{}:{}", host.0, service_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vulnerability identifier (CVE-like string). Unique per episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VulnId(pub String);

impl VulnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VulnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential identifier as reported by the environment adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exploit category a vulnerability belongs to and an exploit action
/// targets (e.g. `rce`, `sqli`, `privilege_escalation`). Open vocabulary,
/// defined per episode by the ingested topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExploitCategory(pub String);

impl ExploitCategory {
    pub fn new(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExploitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Privilege ─────────────────────────────────────────────────────

/// Privilege level held on an owned host. Only ever moves up within an
/// episode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeLevel {
    None,
    User,
    Admin,
}

impl PrivilegeLevel {
    /// Numeric rank stored alongside the string form so graph updates can
    /// guard against downgrades in a single statement.
    pub fn rank(&self) -> i64 {
        match self {
            PrivilegeLevel::None => 0,
            PrivilegeLevel::User => 1,
            PrivilegeLevel::Admin => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeLevel::None => "none",
            PrivilegeLevel::User => "user",
            PrivilegeLevel::Admin => "admin",
        }
    }

    pub fn from_rank(rank: i64) -> Self {
        match rank {
            r if r >= 2 => PrivilegeLevel::Admin,
            1 => PrivilegeLevel::User,
            _ => PrivilegeLevel::None,
        }
    }
}

/// Kind of a leaked credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Password,
    Hash,
    Token,
    Key,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Password => "password",
            CredentialKind::Hash => "hash",
            CredentialKind::Token => "token",
            CredentialKind::Key => "key",
        }
    }
}

// ── Topology (adapter boundary) ───────────────────────────────────

/// Static description of one episode's network, handed over by the
/// environment adapter exactly once per episode.
///
/// Unknown fields are rejected rather than silently dropped; the adapter
/// boundary is the place where untyped observation dictionaries stop.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Topology {
    pub hosts: Vec<HostSpec>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Topology {
    pub fn host(&self, id: &HostId) -> Option<&HostSpec> {
        self.hosts.iter().find(|h| &h.id == id)
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn service_count(&self) -> usize {
        self.hosts.iter().map(|h| h.services.len()).sum()
    }

    pub fn vulnerability_count(&self) -> usize {
        self.hosts
            .iter()
            .flat_map(|h| &h.services)
            .map(|s| s.vulnerabilities.len())
            .sum()
    }
}

/// One host in the static topology, with its embedded service and
/// vulnerability definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSpec {
    pub id: HostId,
    #[serde(default)]
    pub os: Option<String>,
    /// Intrinsic value score of the host as a target (0 for don't-care).
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// A service running on a topology host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<VulnSpec>,
}

/// A vulnerability exposed by a topology service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VulnSpec {
    pub id: VulnId,
    pub category: ExploitCategory,
    #[serde(default)]
    pub cvss: f64,
    /// Exploiting this vulnerability needs a credential valid for the host.
    #[serde(default)]
    pub requires_auth: bool,
}

/// Directed reachability between two topology hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub from: HostId,
    pub to: HostId,
}

// ── Observation delta (adapter boundary) ──────────────────────────

/// Incremental per-step report from the environment adapter: hosts newly
/// discovered, hosts newly owned, credentials newly leaked. Within an
/// episode these are monotonic claims; the synchronizer enforces that
/// defensively rather than trusting the upstream report.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ObservationDelta {
    #[serde(default)]
    pub discovered_hosts: Vec<HostId>,
    #[serde(default)]
    pub owned_hosts: Vec<OwnedHostReport>,
    #[serde(default)]
    pub leaked_credentials: Vec<CredentialLeak>,
}

impl ObservationDelta {
    pub fn is_empty(&self) -> bool {
        self.discovered_hosts.is_empty()
            && self.owned_hosts.is_empty()
            && self.leaked_credentials.is_empty()
    }
}

/// A host the agent now controls, with the privilege level achieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnedHostReport {
    pub host: HostId,
    pub privilege: PrivilegeLevel,
}

/// A credential the environment reports as leaked: found on `leaked_from`,
/// usable against `valid_for`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialLeak {
    pub credential: CredentialId,
    pub kind: CredentialKind,
    #[serde(default)]
    pub username: Option<String>,
    pub leaked_from: HostId,
    pub valid_for: HostId,
}

// ── Edge kinds ────────────────────────────────────────────────────

/// Relationship kinds in the knowledge graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    ConnectedTo,
    Runs,
    Exposes,
    LeakedFrom,
    ValidFor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_deserializes_nested_definitions() {
        let json = r#"{
            "hosts": [
                {
                    "id": "web-01",
                    "os": "linux",
                    "value": 50,
                    "services": [
                        {
                            "name": "http",
                            "port": 80,
                            "vulnerabilities": [
                                {"id": "CVE-2021-41773", "category": "rce", "cvss": 7.5}
                            ]
                        }
                    ]
                },
                {"id": "db-01"}
            ],
            "links": [{"from": "web-01", "to": "db-01"}]
        }"#;

        let topology: Topology = serde_json::from_str(json).unwrap();
        assert_eq!(topology.host_count(), 2);
        assert_eq!(topology.service_count(), 1);
        assert_eq!(topology.vulnerability_count(), 1);
        assert_eq!(topology.links.len(), 1);
        assert!(topology.host(&HostId::new("db-01")).is_some());

        let vuln = &topology.hosts[0].services[0].vulnerabilities[0];
        assert_eq!(vuln.category, ExploitCategory::new("rce"));
        assert!(!vuln.requires_auth);
    }

    #[test]
    fn topology_rejects_unknown_fields() {
        let json = r#"{"hosts": [], "links": [], "simulator_internals": {}}"#;
        assert!(serde_json::from_str::<Topology>(json).is_err());

        let json = r#"{"hosts": [{"id": "a", "agent_installed": true}]}"#;
        assert!(serde_json::from_str::<Topology>(json).is_err());
    }

    #[test]
    fn delta_fields_default_to_empty() {
        let delta: ObservationDelta = serde_json::from_str("{}").unwrap();
        assert!(delta.is_empty());

        let delta: ObservationDelta =
            serde_json::from_str(r#"{"discovered_hosts": ["db-01"]}"#).unwrap();
        assert!(!delta.is_empty());
        assert_eq!(delta.discovered_hosts[0], HostId::new("db-01"));
    }

    #[test]
    fn privilege_rank_orders_levels() {
        assert!(PrivilegeLevel::None < PrivilegeLevel::User);
        assert!(PrivilegeLevel::User < PrivilegeLevel::Admin);
        assert_eq!(PrivilegeLevel::Admin.rank(), 2);
        assert_eq!(PrivilegeLevel::from_rank(1), PrivilegeLevel::User);
        assert_eq!(PrivilegeLevel::from_rank(-3), PrivilegeLevel::None);
    }

    #[test]
    fn edge_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&EdgeKind::ConnectedTo).unwrap();
        assert_eq!(json, "\"CONNECTED_TO\"");

        let json = serde_json::to_string(&EdgeKind::ValidFor).unwrap();
        assert_eq!(json, "\"VALID_FOR\"");
    }

    #[test]
    fn credential_kind_serializes_lowercase() {
        let json = serde_json::to_string(&CredentialKind::Password).unwrap();
        assert_eq!(json, "\"password\"");
    }

    #[test]
    fn service_id_is_derived_from_host_and_name() {
        let id = ServiceId::derived(&HostId::new("web-01"), "http");
        assert_eq!(id.as_str(), "web-01:http");
    }
}
