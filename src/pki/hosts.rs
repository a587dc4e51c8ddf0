//! Subject alternative names of the node certificate.

use rcgen::{string::Ia5String, SanType};
use std::net::IpAddr;

use crate::errors::{Error, Result};

/// Ordered host names and IP literals a node certificate must be valid for.
///
/// Derived from the service names, namespace and cluster domain; never free-form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSet(Vec<String>);

impl HostSet {
    /// Hosts for a cluster reachable through `public_service` and whose pods
    /// are addressed through the headless `discovery_service`.
    pub fn derive(
        public_service: &str,
        discovery_service: &str,
        namespace: &str,
        cluster_domain: &str,
    ) -> Self {
        Self(vec![
            "localhost".to_string(),
            "127.0.0.1".to_string(),
            public_service.to_string(),
            format!("{}.{}", public_service, namespace),
            format!("{}.{}.svc.{}", public_service, namespace, cluster_domain),
            format!("*.{}", discovery_service),
            format!("*.{}.{}", discovery_service, namespace),
            format!("*.{}.{}.svc.{}", discovery_service, namespace, cluster_domain),
        ])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.0.iter().any(|h| h == host)
    }

    /// IP literals become IP SANs, everything else a DNS SAN.
    pub fn to_san_types(&self) -> Result<Vec<SanType>> {
        self.iter()
            .map(|host| match host.parse::<IpAddr>() {
                Ok(ip) => Ok(SanType::IpAddress(ip)),
                Err(_) => Ia5String::try_from(host.to_string())
                    .map(SanType::DnsName)
                    .map_err(|e| Error::signing(format!("invalid DNS name '{}': {}", host, e))),
            })
            .collect()
    }
}
