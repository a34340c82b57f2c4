//! Pure in-memory image of one episode partition.
//!
//! Mask and feature computation never query the store directly; they fold
//! over an [`EpisodeSnapshot`] assembled from one batch of episode-scoped
//! reads. Every template evaluated in one call sees the same state, so
//! identical graph state always yields identical results.

use std::collections::{BTreeMap, HashMap, HashSet};

use vantage_core::types::{EpisodeId, PrivilegeLevel};
use vantage_graph::{CredentialAccessRow, ExposureRow, HostPostureRow};

/// Single-fetch image of one episode partition.
#[derive(Debug, Clone)]
pub struct EpisodeSnapshot {
    pub episode_id: EpisodeId,
    /// Step counter from the Episode marker at fetch time.
    pub step: i64,
    /// Host postures keyed by host id. BTreeMap keeps iteration stable.
    pub hosts: BTreeMap<String, HostPostureRow>,
    /// Credential leak/validity pairs present in the partition.
    pub credentials: Vec<CredentialAccessRow>,
    /// Directed CONNECTED_TO out-edges per host.
    out_edges: HashMap<String, HashSet<String>>,
    /// Exposure paths grouped by the host that runs the service.
    exposures: HashMap<String, Vec<ExposureRow>>,
}

impl EpisodeSnapshot {
    /// Assemble a snapshot from episode-scoped query rows.
    pub fn from_rows(
        episode_id: EpisodeId,
        step: i64,
        postures: Vec<HostPostureRow>,
        links: Vec<(String, String)>,
        exposure_rows: Vec<ExposureRow>,
        credentials: Vec<CredentialAccessRow>,
    ) -> Self {
        let hosts = postures
            .into_iter()
            .map(|row| (row.id.clone(), row))
            .collect();

        let mut out_edges: HashMap<String, HashSet<String>> = HashMap::new();
        for (from, to) in links {
            out_edges.entry(from).or_default().insert(to);
        }

        let mut exposures: HashMap<String, Vec<ExposureRow>> = HashMap::new();
        for row in exposure_rows {
            exposures.entry(row.host_id.clone()).or_default().push(row);
        }

        Self {
            episode_id,
            step,
            hosts,
            credentials,
            out_edges,
            exposures,
        }
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn knows_host(&self, id: &str) -> bool {
        self.hosts.contains_key(id)
    }

    pub fn posture(&self, id: &str) -> Option<&HostPostureRow> {
        self.hosts.get(id)
    }

    /// True when any ingested vulnerability carries this category.
    pub fn knows_category(&self, category: &str) -> bool {
        self.exposures
            .values()
            .flatten()
            .any(|e| e.category == category)
    }

    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.out_edges
            .get(from)
            .map_or(false, |targets| targets.contains(to))
    }

    /// Any owned host with a CONNECTED_TO edge to `target`.
    pub fn reachable_from_owned(&self, target: &str) -> bool {
        self.owned().any(|row| self.is_reachable(&row.id, target))
    }

    /// CONNECTED_TO targets of one host.
    pub fn neighbors(&self, host: &str) -> impl Iterator<Item = &str> {
        self.out_edges
            .get(host)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Owned host postures, in stable id order.
    pub fn owned(&self) -> impl Iterator<Item = &HostPostureRow> {
        self.hosts.values().filter(|row| row.owned)
    }

    /// Vulnerability exposures of one host; empty for unknown hosts.
    pub fn exposures_of(&self, host: &str) -> &[ExposureRow] {
        self.exposures.get(host).map_or(&[], Vec::as_slice)
    }

    pub fn exposes_category(&self, host: &str, category: &str) -> bool {
        self.exposures_of(host)
            .iter()
            .any(|e| e.category == category)
    }

    /// A credential usable against `target`: VALID_FOR it and leaked from
    /// a host that is currently owned.
    pub fn has_credential_for(&self, target: &str) -> bool {
        self.credentials.iter().any(|c| {
            c.valid_for == target && self.posture(&c.leaked_from).map_or(false, |p| p.owned)
        })
    }

    pub fn privilege_of(&self, host: &str) -> PrivilegeLevel {
        self.posture(host)
            .map_or(PrivilegeLevel::None, |p| {
                PrivilegeLevel::from_rank(p.privilege_rank)
            })
    }
}
