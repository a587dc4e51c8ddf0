//! Immutable configuration for one provisioning run.

use crate::config::CertConfig;
use crate::domain::{CertRole, KeyEncoding, SecretNames};
use crate::errors::{Error, Result};
use crate::pki::HostSet;
use crate::secrets::store::validate_name;
use std::time::Duration;

/// Default RSA modulus size in bits
pub const DEFAULT_KEY_SIZE: usize = 2048;

/// Smallest RSA modulus the signer accepts
pub const MIN_KEY_SIZE: usize = 2048;

/// Largest RSA modulus the signer accepts
pub const MAX_KEY_SIZE: usize = 8192;

/// Default cluster DNS domain
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Default principal embedded in the client certificate
pub const DEFAULT_CLIENT_PRINCIPAL: &str = "root";

const HOUR: u64 = 3600;

/// Everything a run needs to know, fixed at construction.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// RSA key size for every generated key
    pub key_size: usize,

    /// Keep the existing CA private key when the CA certificate is reissued
    pub allow_ca_key_reuse: bool,

    /// Allow replacing files already present in the working area
    pub overwrite_files: bool,

    /// Encode the client key as PKCS#8 instead of PKCS#1
    pub pkcs8_client_key: bool,

    pub ca: CertConfig,
    pub node: CertConfig,
    pub client: CertConfig,

    /// Service clients connect through (`crdb-public`)
    pub public_service_name: String,

    /// Headless service used for peer discovery (`crdb`); also prefixes secret names
    pub discovery_service_name: String,

    pub cluster_domain: String,

    /// Externally managed CA secret; when set no CA is ever generated
    pub ca_secret: Option<String>,

    /// Principal embedded in the client certificate
    pub client_principal: String,
}

impl GeneratorConfig {
    /// Configuration with the chart defaults for the given services.
    pub fn new(
        public_service_name: impl Into<String>,
        discovery_service_name: impl Into<String>,
    ) -> Self {
        Self {
            key_size: DEFAULT_KEY_SIZE,
            allow_ca_key_reuse: false,
            overwrite_files: false,
            pkcs8_client_key: false,
            ca: CertConfig {
                duration: Duration::from_secs(43_800 * HOUR),
                renewal_window: Duration::from_secs(648 * HOUR),
            },
            node: CertConfig {
                duration: Duration::from_secs(8_760 * HOUR),
                renewal_window: Duration::from_secs(168 * HOUR),
            },
            client: CertConfig {
                duration: Duration::from_secs(672 * HOUR),
                renewal_window: Duration::from_secs(48 * HOUR),
            },
            public_service_name: public_service_name.into(),
            discovery_service_name: discovery_service_name.into(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            ca_secret: None,
            client_principal: DEFAULT_CLIENT_PRINCIPAL.to_string(),
        }
    }

    pub fn with_key_size(mut self, key_size: usize) -> Self {
        self.key_size = key_size;
        self
    }

    pub fn with_ca_key_reuse(mut self, allow: bool) -> Self {
        self.allow_ca_key_reuse = allow;
        self
    }

    pub fn with_overwrite_files(mut self, overwrite: bool) -> Self {
        self.overwrite_files = overwrite;
        self
    }

    pub fn with_pkcs8_client_key(mut self, pkcs8: bool) -> Self {
        self.pkcs8_client_key = pkcs8;
        self
    }

    /// Replace the lifetime configuration of one role
    pub fn with_cert_config(mut self, role: CertRole, config: CertConfig) -> Self {
        match role {
            CertRole::Ca => self.ca = config,
            CertRole::Node => self.node = config,
            CertRole::Client => self.client = config,
        }
        self
    }

    pub fn with_cluster_domain(mut self, domain: impl Into<String>) -> Self {
        self.cluster_domain = domain.into();
        self
    }

    pub fn with_ca_secret(mut self, name: impl Into<String>) -> Self {
        self.ca_secret = Some(name.into());
        self
    }

    pub fn with_client_principal(mut self, principal: impl Into<String>) -> Self {
        self.client_principal = principal.into();
        self
    }

    /// Check the configuration before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_KEY_SIZE..=MAX_KEY_SIZE).contains(&self.key_size) {
            return Err(Error::config(format!(
                "key size {} is outside the supported range {}..={}",
                self.key_size, MIN_KEY_SIZE, MAX_KEY_SIZE
            )));
        }
        for (field, value) in [
            ("public service name", &self.public_service_name),
            ("discovery service name", &self.discovery_service_name),
            ("cluster domain", &self.cluster_domain),
            ("client principal", &self.client_principal),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{} cannot be empty", field)));
            }
        }
        if matches!(&self.ca_secret, Some(name) if name.trim().is_empty()) {
            return Err(Error::config("CA secret name cannot be empty when provided"));
        }

        let names = self.secret_names();
        for role in CertRole::ALL {
            validate_name("secret name", &names.for_role(role))
                .map_err(|e| Error::config(e.to_string()))?;
        }
        if let Some(name) = &self.ca_secret {
            validate_name("CA secret name", name).map_err(|e| Error::config(e.to_string()))?;
        }

        if self.client_principal.contains(['/', '\\', '\0'])
            || matches!(self.client_principal.as_str(), "." | "..")
        {
            return Err(Error::config(format!(
                "client principal '{}' cannot be used as a file name",
                self.client_principal
            )));
        }

        for role in CertRole::ALL {
            self.cert_config(role).validate().map_err(|e| match e {
                Error::ConfigParse(message) => {
                    Error::config(format!("{} certificate: {}", role, message))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Lifetime configuration for `role`
    pub fn cert_config(&self, role: CertRole) -> &CertConfig {
        match role {
            CertRole::Ca => &self.ca,
            CertRole::Node => &self.node,
            CertRole::Client => &self.client,
        }
    }

    pub fn secret_names(&self) -> SecretNames {
        SecretNames::new(&self.discovery_service_name)
    }

    /// Subject alternative names for the node certificate in `namespace`
    pub fn host_set(&self, namespace: &str) -> HostSet {
        HostSet::derive(
            &self.public_service_name,
            &self.discovery_service_name,
            namespace,
            &self.cluster_domain,
        )
    }

    pub fn client_key_encoding(&self) -> KeyEncoding {
        if self.pkcs8_client_key {
            KeyEncoding::Pkcs8
        } else {
            KeyEncoding::Pkcs1
        }
    }
}
