//! Certificate roles and secret naming.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::secrets::SecretType;

/// The three certificate roles of a cluster, in the order they are provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertRole {
    /// Self-signed certificate authority
    Ca,
    /// Node certificate used for node-to-node and SQL server TLS
    Node,
    /// Client certificate for a database principal
    Client,
}

impl CertRole {
    /// All roles in provisioning order
    pub const ALL: [CertRole; 3] = [CertRole::Ca, CertRole::Node, CertRole::Client];

    /// Short identifier used in secret names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ca => "ca",
            Self::Node => "node",
            Self::Client => "client",
        }
    }

    /// Store type of the secret holding this role's bundle
    pub fn secret_type(&self) -> SecretType {
        match self {
            Self::Ca => SecretType::Opaque,
            Self::Node | Self::Client => SecretType::Tls,
        }
    }
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ca => "CA",
            Self::Node => "Node",
            Self::Client => "Client",
        };
        f.write_str(label)
    }
}

impl FromStr for CertRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ca" => Ok(Self::Ca),
            "node" => Ok(Self::Node),
            "client" => Ok(Self::Client),
            _ => Err(format!("Unknown certificate role: {}", s)),
        }
    }
}

/// Secret names derived from the discovery service name.
///
/// `<discovery>-ca-secret`, `<discovery>-node-secret`, `<discovery>-client-secret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNames {
    discovery_service: String,
}

impl SecretNames {
    pub fn new(discovery_service: impl Into<String>) -> Self {
        Self { discovery_service: discovery_service.into() }
    }

    /// Name of the secret holding the bundle for `role`
    pub fn for_role(&self, role: CertRole) -> String {
        format!("{}-{}-secret", self.discovery_service, role.as_str())
    }

    pub fn ca(&self) -> String {
        self.for_role(CertRole::Ca)
    }

    pub fn node(&self) -> String {
        self.for_role(CertRole::Node)
    }

    pub fn client(&self) -> String {
        self.for_role(CertRole::Client)
    }
}
