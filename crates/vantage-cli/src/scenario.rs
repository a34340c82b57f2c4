//! Scripted demo episode against a live store.
//!
//! Drives one complete episode exactly the way a training loop would:
//! ingest → per-step observation deltas with mask/feature reads between
//! them → reset → report. The environment adapter is played by a fixed
//! script; everything underneath it is the real stack.

use vantage_advisor::{explain, ActionAssessment, Advisor, EpisodeSnapshot};
use vantage_core::actions::{ActionKind, ActionSpace, ActionTemplate};
use vantage_core::types::{
    CredentialId, CredentialKind, CredentialLeak, EpisodeId, ExploitCategory, HostId, HostSpec,
    Link, ObservationDelta, OwnedHostReport, PrivilegeLevel, ServiceSpec, Topology, VulnId,
    VulnSpec,
};
use vantage_graph::GraphClient;
use vantage_journal::recorder::JournalRecorder;
use vantage_journal::report::{render_episode_report, HostStatus, NetworkSnapshot};
use vantage_journal::store::{FileJournalStore, JournalStore};
use vantage_sync::Synchronizer;

/// Run the scripted chain-breach episode and return its markdown report.
pub async fn run_demo_episode(
    graph: &GraphClient,
    environment: &str,
    journal_dir: Option<&str>,
    keep: bool,
) -> anyhow::Result<String> {
    let episode = EpisodeId::new();
    let sync = Synchronizer::new(graph.clone());
    let advisor = Advisor::new(graph.clone());

    let mut recorder = JournalRecorder::new(&episode, environment);
    recorder.set_context(serde_json::json!({
        "scenario": "three-host chain breach",
        "hosts": ["web-01", "app-01", "db-01"],
    }));

    tracing::info!(episode_id = %episode, environment, "Starting demo episode");

    let summary = sync.ingest_topology(&episode, &demo_topology()).await?;
    recorder.record_topology_ingested(
        0,
        summary.hosts,
        summary.services,
        summary.vulnerabilities,
        summary.links,
    );

    let space = demo_action_space();

    for (index, (note, delta)) in demo_script().into_iter().enumerate() {
        let step = index as i64 + 1;

        let summary = sync.apply_observation_delta(&episode, &delta).await?;
        recorder.record_delta_applied(
            step,
            summary.discovered,
            summary.owned,
            summary.credentials,
            summary.skipped.len(),
        );
        for skip in &summary.skipped {
            recorder.record_entity_skipped(step, skip.entry.as_str(), skip.host.as_str());
        }

        let advice = advisor.step_advice(&episode, &space).await?;
        recorder.record_mask_computed(step, advice.mask.len(), advice.mask.valid_count());
        let features = advice.features.to_vector();
        recorder.record_features_extracted(
            step,
            features[0],
            features[1],
            features[2],
            features[3],
        );

        tracing::info!(
            step,
            note,
            phase = %advice.phase,
            valid_actions = advice.mask.valid_count(),
            "Step complete"
        );
    }

    // Final state, captured before the partition goes away.
    let snapshot = advisor.snapshot(&episode).await?;
    let assessments = explain::explain_space(&snapshot, &space)?;
    let network = network_snapshot(&snapshot);

    if !keep {
        let deleted = sync.reset_episode(&episode).await?;
        recorder.record_episode_reset(snapshot.step + 1, deleted);
    }

    let journal = recorder.finalize();

    if let Some(dir) = journal_dir {
        let store = FileJournalStore::new(dir)?;
        store.save(&journal)?;
        tracing::info!(journal_id = %journal.id, dir, "Journal saved");
    }

    let mut output = render_episode_report(&journal, Some(&network));
    output.push('\n');
    output.push_str(&assessment_section(&assessments));
    Ok(output)
}

/// web-01 → app-01 → db-01, one service and one vulnerability each.
/// The app tier hides behind an auth-gated exploit so the script has to
/// leak a credential before it can move laterally.
fn demo_topology() -> Topology {
    Topology {
        hosts: vec![
            HostSpec {
                id: HostId::new("web-01"),
                os: Some("linux".to_string()),
                value: 20,
                services: vec![service("http", 80, "CVE-2021-41773", "rce", 7.5, false)],
            },
            HostSpec {
                id: HostId::new("app-01"),
                os: Some("windows".to_string()),
                value: 50,
                services: vec![service("smb", 445, "CVE-2017-0144", "rce", 8.1, true)],
            },
            HostSpec {
                id: HostId::new("db-01"),
                os: Some("linux".to_string()),
                value: 90,
                services: vec![service("postgres", 5432, "CVE-2019-9193", "sqli", 7.2, false)],
            },
        ],
        links: vec![link("web-01", "app-01"), link("app-01", "db-01")],
    }
}

fn service(
    name: &str,
    port: u16,
    vuln: &str,
    category: &str,
    cvss: f64,
    requires_auth: bool,
) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        port: Some(port),
        version: None,
        vulnerabilities: vec![VulnSpec {
            id: VulnId::new(vuln),
            category: ExploitCategory::new(category),
            cvss,
            requires_auth,
        }],
    }
}

fn link(from: &str, to: &str) -> Link {
    Link {
        from: HostId::new(from),
        to: HostId::new(to),
    }
}

fn demo_action_space() -> ActionSpace {
    ActionSpace::new(vec![
        scan("web-01"),
        scan("app-01"),
        scan("db-01"),
        exploit(ActionKind::RemoteExploit, "app-01", "rce"),
        exploit(ActionKind::RemoteExploit, "db-01", "sqli"),
        exploit(ActionKind::LocalExploit, "app-01", "rce"),
        connect("db-01"),
    ])
}

fn scan(target: &str) -> ActionTemplate {
    ActionTemplate {
        kind: ActionKind::Scan,
        target: HostId::new(target),
        source: None,
        category: None,
        requires_credential: false,
        cost: 1.0,
        noise: 0.1,
    }
}

fn exploit(kind: ActionKind, target: &str, category: &str) -> ActionTemplate {
    ActionTemplate {
        kind,
        target: HostId::new(target),
        source: None,
        category: Some(ExploitCategory::new(category)),
        requires_credential: false,
        cost: 3.0,
        noise: 0.5,
    }
}

fn connect(target: &str) -> ActionTemplate {
    ActionTemplate {
        kind: ActionKind::Connect,
        target: HostId::new(target),
        source: None,
        category: None,
        requires_credential: false,
        cost: 0.5,
        noise: 0.0,
    }
}

/// What the environment "reports" each step. The vpn-99 entry references
/// a host outside the topology on purpose: it exercises the skip-and-log
/// path without aborting the episode.
fn demo_script() -> Vec<(&'static str, ObservationDelta)> {
    vec![
        (
            "perimeter scan maps the web tier",
            discover(&["web-01"]),
        ),
        (
            "web exploit lands a user shell",
            own("web-01", PrivilegeLevel::User),
        ),
        (
            "foothold enumerates inward, one report is bogus",
            discover(&["app-01", "vpn-99"]),
        ),
        (
            "credential dump on the web host",
            leak("cred-smb-backup", "web-01", "app-01"),
        ),
        (
            "credentialed exploit takes the app tier",
            merge(own("app-01", PrivilegeLevel::User), discover(&["db-01"])),
        ),
        (
            "sql injection roots the database",
            own("db-01", PrivilegeLevel::Admin),
        ),
    ]
}

fn discover(hosts: &[&str]) -> ObservationDelta {
    ObservationDelta {
        discovered_hosts: hosts.iter().map(|h| HostId::new(*h)).collect(),
        owned_hosts: vec![],
        leaked_credentials: vec![],
    }
}

fn own(host: &str, privilege: PrivilegeLevel) -> ObservationDelta {
    ObservationDelta {
        discovered_hosts: vec![],
        owned_hosts: vec![OwnedHostReport {
            host: HostId::new(host),
            privilege,
        }],
        leaked_credentials: vec![],
    }
}

fn leak(credential: &str, from: &str, target: &str) -> ObservationDelta {
    ObservationDelta {
        discovered_hosts: vec![],
        owned_hosts: vec![],
        leaked_credentials: vec![CredentialLeak {
            credential: CredentialId::new(credential),
            kind: CredentialKind::Password,
            username: Some("svc-backup".to_string()),
            leaked_from: HostId::new(from),
            valid_for: HostId::new(target),
        }],
    }
}

fn merge(mut a: ObservationDelta, b: ObservationDelta) -> ObservationDelta {
    a.discovered_hosts.extend(b.discovered_hosts);
    a.owned_hosts.extend(b.owned_hosts);
    a.leaked_credentials.extend(b.leaked_credentials);
    a
}

fn network_snapshot(snapshot: &EpisodeSnapshot) -> NetworkSnapshot {
    let hosts = snapshot
        .hosts
        .values()
        .map(|row| HostStatus {
            id: row.id.clone(),
            discovered: row.discovered,
            owned: row.owned,
            privilege: PrivilegeLevel::from_rank(row.privilege_rank)
                .as_str()
                .to_string(),
        })
        .collect();

    let reachability = snapshot
        .hosts
        .keys()
        .flat_map(|id| {
            snapshot
                .neighbors(id)
                .map(move |to| (id.clone(), to.to_string()))
        })
        .collect();

    NetworkSnapshot {
        hosts,
        reachability,
    }
}

fn assessment_section(assessments: &[ActionAssessment]) -> String {
    let mut lines = vec!["## Final Action Assessments".to_string(), String::new()];
    for a in assessments {
        let verdict = match &a.blocked_by {
            Some(reason) => format!("blocked ({reason})"),
            None => "valid".to_string(),
        };
        let mut line = format!("- {}: {}", a.label, verdict);
        if let Some(path) = &a.exploit_path {
            line.push_str(&format!(" via {path}"));
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_topology_is_well_formed() {
        assert!(vantage_sync::validate::validate_topology(&demo_topology()).is_ok());
    }

    #[test]
    fn demo_space_only_targets_topology_hosts() {
        let topology = demo_topology();
        let ids: Vec<String> = topology.hosts.iter().map(|h| h.id.to_string()).collect();
        for template in demo_action_space().iter() {
            assert!(ids.contains(&template.target.to_string()));
        }
    }

    #[test]
    fn demo_script_reports_each_host_owned_once() {
        let owned: Vec<String> = demo_script()
            .into_iter()
            .flat_map(|(_, delta)| delta.owned_hosts)
            .map(|report| report.host.to_string())
            .collect();
        assert_eq!(owned, vec!["web-01", "app-01", "db-01"]);
    }
}
