//! Topology validation: a pure pass over the static description before
//! anything is written to the graph.
//!
//! Ingestion is all-or-nothing, so every structural problem is rejected
//! up front: duplicate ids would silently merge distinct entities under
//! `MERGE`, and dangling links would silently drop edges.

use std::collections::HashSet;

use vantage_core::types::Topology;

use crate::error::{Result, SyncError};

/// Check a topology for schema violations. Returns the first one found.
pub fn validate_topology(topology: &Topology) -> Result<()> {
    let mut host_ids = HashSet::new();
    let mut vuln_ids = HashSet::new();

    for host in &topology.hosts {
        if host.id.as_str().is_empty() {
            return Err(SyncError::schema("host with empty id"));
        }
        if !host_ids.insert(host.id.as_str()) {
            return Err(SyncError::schema(format!(
                "duplicate host id: {}",
                host.id
            )));
        }

        let mut service_names = HashSet::new();
        for service in &host.services {
            if service.name.is_empty() {
                return Err(SyncError::schema(format!(
                    "host {} has a service with an empty name",
                    host.id
                )));
            }
            if !service_names.insert(service.name.as_str()) {
                return Err(SyncError::schema(format!(
                    "host {} has duplicate service name: {}",
                    host.id, service.name
                )));
            }

            for vuln in &service.vulnerabilities {
                if vuln.id.as_str().is_empty() {
                    return Err(SyncError::schema(format!(
                        "service {}:{} has a vulnerability with an empty id",
                        host.id, service.name
                    )));
                }
                if !vuln_ids.insert(vuln.id.as_str()) {
                    return Err(SyncError::schema(format!(
                        "duplicate vulnerability id: {}",
                        vuln.id
                    )));
                }
                if vuln.category.as_str().is_empty() {
                    return Err(SyncError::schema(format!(
                        "vulnerability {} has an empty category",
                        vuln.id
                    )));
                }
                if !(0.0..=10.0).contains(&vuln.cvss) {
                    return Err(SyncError::schema(format!(
                        "vulnerability {} has CVSS {} outside 0.0..=10.0",
                        vuln.id, vuln.cvss
                    )));
                }
            }
        }
    }

    for link in &topology.links {
        if !host_ids.contains(link.from.as_str()) {
            return Err(SyncError::schema(format!(
                "link references unknown host: {}",
                link.from
            )));
        }
        if !host_ids.contains(link.to.as_str()) {
            return Err(SyncError::schema(format!(
                "link references unknown host: {}",
                link.to
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::types::{ExploitCategory, HostId, HostSpec, Link, ServiceSpec, VulnId, VulnSpec};

    fn host(id: &str) -> HostSpec {
        HostSpec {
            id: HostId::new(id),
            os: None,
            value: 0,
            services: vec![],
        }
    }

    fn service(name: &str, vulns: Vec<VulnSpec>) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            port: None,
            version: None,
            vulnerabilities: vulns,
        }
    }

    fn vuln(id: &str, cvss: f64) -> VulnSpec {
        VulnSpec {
            id: VulnId::new(id),
            category: ExploitCategory::new("rce"),
            cvss,
            requires_auth: false,
        }
    }

    #[test]
    fn accepts_well_formed_topology() {
        let mut web = host("web-01");
        web.services.push(service("http", vec![vuln("CVE-1", 7.5)]));
        let topology = Topology {
            hosts: vec![web, host("db-01")],
            links: vec![Link {
                from: HostId::new("web-01"),
                to: HostId::new("db-01"),
            }],
        };

        assert!(validate_topology(&topology).is_ok());
    }

    #[test]
    fn rejects_duplicate_host_id() {
        let topology = Topology {
            hosts: vec![host("web-01"), host("web-01")],
            links: vec![],
        };

        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("duplicate host id"));
    }

    #[test]
    fn rejects_dangling_link() {
        let topology = Topology {
            hosts: vec![host("web-01")],
            links: vec![Link {
                from: HostId::new("web-01"),
                to: HostId::new("ghost-99"),
            }],
        };

        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("unknown host: ghost-99"));
    }

    #[test]
    fn rejects_duplicate_service_name_on_one_host() {
        let mut web = host("web-01");
        web.services.push(service("http", vec![]));
        web.services.push(service("http", vec![]));
        let topology = Topology {
            hosts: vec![web],
            links: vec![],
        };

        assert!(validate_topology(&topology).is_err());
    }

    #[test]
    fn allows_same_service_name_on_different_hosts() {
        let mut a = host("web-01");
        a.services.push(service("ssh", vec![]));
        let mut b = host("web-02");
        b.services.push(service("ssh", vec![]));
        let topology = Topology {
            hosts: vec![a, b],
            links: vec![],
        };

        assert!(validate_topology(&topology).is_ok());
    }

    #[test]
    fn rejects_duplicate_vulnerability_id_across_services() {
        let mut a = host("web-01");
        a.services.push(service("http", vec![vuln("CVE-1", 5.0)]));
        let mut b = host("web-02");
        b.services.push(service("ftp", vec![vuln("CVE-1", 5.0)]));
        let topology = Topology {
            hosts: vec![a, b],
            links: vec![],
        };

        let err = validate_topology(&topology).unwrap_err();
        assert!(err.to_string().contains("duplicate vulnerability id"));
    }

    #[test]
    fn rejects_cvss_out_of_range() {
        let mut web = host("web-01");
        web.services.push(service("http", vec![vuln("CVE-1", 11.0)]));
        let topology = Topology {
            hosts: vec![web],
            links: vec![],
        };

        let err = validate_topology(&topology).unwrap_err();
        assert!(matches!(err, SyncError::Schema { .. }));
    }

    #[test]
    fn rejects_empty_host_id() {
        let topology = Topology {
            hosts: vec![host("")],
            links: vec![],
        };

        assert!(validate_topology(&topology).is_err());
    }

    #[test]
    fn accepts_empty_topology() {
        assert!(validate_topology(&Topology::default()).is_ok());
    }
}
