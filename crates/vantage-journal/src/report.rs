//! Markdown episode reports rendered from a journal.
//!
//! Reports summarize one episode for a human reader: what was ingested,
//! how the masks and features evolved, which delta entries were skipped,
//! and (when the caller supplies one) a final map of the network state.

use chrono::Utc;

use crate::{EpisodeJournal, StepEvent};

/// Final network state for the report's map section, as seen by the
/// caller at render time. The journal itself carries only events, so a
/// map is optional.
#[derive(Debug, Clone, Default)]
pub struct NetworkSnapshot {
    pub hosts: Vec<HostStatus>,
    /// Directed reachability pairs (from, to).
    pub reachability: Vec<(String, String)>,
}

/// One host's posture at render time.
#[derive(Debug, Clone)]
pub struct HostStatus {
    pub id: String,
    pub discovered: bool,
    pub owned: bool,
    pub privilege: String,
}

/// How many step records the log section shows at most.
const STEP_LOG_LIMIT: usize = 20;

/// Render a complete markdown report for an episode.
pub fn render_episode_report(journal: &EpisodeJournal, network: Option<&NetworkSnapshot>) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# Episode Report: {}", journal.episode_id));
    lines.push(format!(
        "**Generated:** {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());

    lines.extend(summary_section(journal, network));
    lines.push(String::new());

    lines.extend(metrics_section(journal));
    lines.push(String::new());

    if let Some(features) = last_features(journal) {
        lines.extend(features);
        lines.push(String::new());
    }

    lines.extend(step_log_section(journal));

    if let Some(snapshot) = network {
        lines.push(String::new());
        lines.extend(network_map_section(snapshot));
    }

    lines.join("\n")
}

fn summary_section(journal: &EpisodeJournal, network: Option<&NetworkSnapshot>) -> Vec<String> {
    let status = if journal.completed_at.is_some() {
        "complete"
    } else {
        "in progress"
    };
    let final_step = journal.steps.iter().map(|r| r.step).max().unwrap_or(0);

    let mut summary = vec![
        "## Summary".to_string(),
        String::new(),
        format!("**Status:** {status}"),
        format!("**Environment:** {}", journal.environment),
        format!("**Events Recorded:** {}", journal.steps.len()),
        format!("**Final Step:** {final_step}"),
    ];

    if let Some(snapshot) = network {
        let discovered = snapshot.hosts.iter().filter(|h| h.discovered).count();
        let owned = snapshot.hosts.iter().filter(|h| h.owned).count();
        summary.push(format!("**Hosts Compromised:** {owned}/{discovered}"));
    }

    summary
}

fn metrics_section(journal: &EpisodeJournal) -> Vec<String> {
    let mut topology_hosts = 0;
    let mut topology_services = 0;
    let mut topology_vulns = 0;
    let mut deltas_applied = 0;
    let mut entities_skipped = 0;
    let mut masks_computed = 0;
    let mut last_mask: Option<(usize, usize)> = None;

    for record in &journal.steps {
        match &record.event {
            StepEvent::TopologyIngested {
                hosts,
                services,
                vulnerabilities,
                ..
            } => {
                topology_hosts = *hosts;
                topology_services = *services;
                topology_vulns = *vulnerabilities;
            }
            StepEvent::DeltaApplied { .. } => deltas_applied += 1,
            StepEvent::EntitySkipped { .. } => entities_skipped += 1,
            StepEvent::MaskComputed { total, valid } => {
                masks_computed += 1;
                last_mask = Some((*valid, *total));
            }
            _ => {}
        }
    }

    let mut metrics = vec![
        "## Knowledge Metrics".to_string(),
        String::new(),
        "| Metric | Value |".to_string(),
        "|--------|-------|".to_string(),
        format!("| Topology Hosts | {topology_hosts} |"),
        format!("| Topology Services | {topology_services} |"),
        format!("| Topology Vulnerabilities | {topology_vulns} |"),
        format!("| Deltas Applied | {deltas_applied} |"),
        format!("| Entities Skipped | {entities_skipped} |"),
        format!("| Masks Computed | {masks_computed} |"),
    ];

    if let Some((valid, total)) = last_mask {
        metrics.push(format!("| Last Mask | {valid}/{total} valid |"));
    }

    metrics
}

/// The most recent extracted feature vector, if any was recorded.
fn last_features(journal: &EpisodeJournal) -> Option<Vec<String>> {
    journal.steps.iter().rev().find_map(|record| {
        if let StepEvent::FeaturesExtracted {
            attack_surface,
            pivot_opportunities,
            credential_leverage,
            owned_hosts,
        } = &record.event
        {
            Some(vec![
                "## Strategic Features".to_string(),
                String::new(),
                format!("- **Attack Surface:** {attack_surface:.2}"),
                format!("- **Pivot Opportunities:** {pivot_opportunities:.2}"),
                format!("- **Credential Leverage:** {credential_leverage:.2}"),
                format!("- **Owned Hosts:** {owned_hosts:.0}"),
            ])
        } else {
            None
        }
    })
}

fn step_log_section(journal: &EpisodeJournal) -> Vec<String> {
    let mut log = vec!["## Step Log".to_string(), String::new()];

    if journal.steps.is_empty() {
        log.push("*No events recorded*".to_string());
        return log;
    }

    if journal.steps.len() > STEP_LOG_LIMIT {
        log.push(format!("*Showing last {STEP_LOG_LIMIT} events*"));
        log.push(String::new());
    }

    let skip = journal.steps.len().saturating_sub(STEP_LOG_LIMIT);
    for record in journal.steps.iter().skip(skip) {
        log.push(format!(
            "- step {}: {}",
            record.step,
            describe_event(&record.event)
        ));
    }

    log
}

fn describe_event(event: &StepEvent) -> String {
    match event {
        StepEvent::TopologyIngested {
            hosts,
            services,
            vulnerabilities,
            links,
        } => format!(
            "topology ingested ({hosts} hosts, {services} services, \
             {vulnerabilities} vulnerabilities, {links} links)"
        ),
        StepEvent::DeltaApplied {
            discovered,
            owned,
            credentials,
            skipped,
        } => format!(
            "delta applied ({discovered} discovered, {owned} owned, \
             {credentials} credentials, {skipped} skipped)"
        ),
        StepEvent::EntitySkipped { kind, id } => {
            format!("skipped unknown {kind} `{id}`")
        }
        StepEvent::MaskComputed { total, valid } => {
            format!("mask computed ({valid}/{total} actions valid)")
        }
        StepEvent::FeaturesExtracted {
            attack_surface,
            pivot_opportunities,
            credential_leverage,
            owned_hosts,
        } => format!(
            "features extracted (surface {attack_surface:.2}, pivots \
             {pivot_opportunities:.2}, leverage {credential_leverage:.2}, \
             owned {owned_hosts:.0})"
        ),
        StepEvent::EpisodeReset { nodes_deleted } => {
            format!("episode reset ({nodes_deleted} nodes deleted)")
        }
    }
}

fn network_map_section(snapshot: &NetworkSnapshot) -> Vec<String> {
    let mut map = vec!["## Network Map".to_string(), String::new(), "```".to_string()];

    for host in &snapshot.hosts {
        let line = if host.owned {
            format!("[OWNED]      {} ({})", host.id, host.privilege)
        } else if host.discovered {
            format!("[discovered] {}", host.id)
        } else {
            format!("[hidden]     {}", host.id)
        };
        map.push(line);
    }
    map.push("```".to_string());

    if !snapshot.reachability.is_empty() {
        map.push(String::new());
        map.push("### Connections".to_string());
        for (from, to) in &snapshot.reachability {
            map.push(format!("- {from} -> {to}"));
        }
    }

    map
}
