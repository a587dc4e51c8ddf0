//! Generator flags shared by the `generate` and `status` subcommands.
//!
//! Every flag can also be set through a `SELF_SIGNER_*` environment variable.

use clap::Args;

use crate::config::{CertConfig, GeneratorConfig, DEFAULT_CLUSTER_DOMAIN, DEFAULT_KEY_SIZE};
use crate::domain::CertRole;
use crate::errors::Result;

#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Namespace the secrets live in
    #[arg(short, long, env = "SELF_SIGNER_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Public service name of the cluster
    #[arg(long, env = "SELF_SIGNER_PUBLIC_SERVICE")]
    pub public_service: String,

    /// Headless discovery service name; also prefixes every secret name
    #[arg(long, env = "SELF_SIGNER_DISCOVERY_SERVICE")]
    pub discovery_service: String,

    /// Kubernetes cluster domain used in node SANs
    #[arg(long, env = "SELF_SIGNER_CLUSTER_DOMAIN", default_value = DEFAULT_CLUSTER_DOMAIN)]
    pub cluster_domain: String,

    /// RSA key size in bits
    #[arg(long, env = "SELF_SIGNER_KEY_SIZE", default_value_t = DEFAULT_KEY_SIZE)]
    pub key_size: usize,

    /// Keep the existing CA private key when the CA certificate is regenerated
    #[arg(long, env = "SELF_SIGNER_ALLOW_CA_KEY_REUSE")]
    pub allow_ca_key_reuse: bool,

    /// Allow files in the working directory to be overwritten
    #[arg(long, env = "SELF_SIGNER_OVERWRITE_FILES")]
    pub overwrite_files: bool,

    /// Encode the client private key as PKCS#8 instead of PKCS#1
    #[arg(long, env = "SELF_SIGNER_PKCS8_CLIENT_KEY")]
    pub pkcs8_client_key: bool,

    /// Name of a user-managed secret holding ca.crt and ca.key
    #[arg(long, env = "SELF_SIGNER_CA_SECRET")]
    pub ca_secret: Option<String>,

    /// Principal embedded in the client certificate
    #[arg(long, env = "SELF_SIGNER_CLIENT_PRINCIPAL", default_value = "root")]
    pub client_principal: String,

    /// CA certificate validity
    #[arg(long, env = "SELF_SIGNER_CA_DURATION", default_value = "43800h")]
    pub ca_duration: String,

    /// Regenerate the CA this long before it expires
    #[arg(long, env = "SELF_SIGNER_CA_EXPIRY_WINDOW", default_value = "648h")]
    pub ca_expiry_window: String,

    /// Node certificate validity
    #[arg(long, env = "SELF_SIGNER_NODE_DURATION", default_value = "8760h")]
    pub node_duration: String,

    /// Regenerate node certificates this long before they expire
    #[arg(long, env = "SELF_SIGNER_NODE_EXPIRY_WINDOW", default_value = "168h")]
    pub node_expiry_window: String,

    /// Client certificate validity
    #[arg(long, env = "SELF_SIGNER_CLIENT_DURATION", default_value = "672h")]
    pub client_duration: String,

    /// Regenerate client certificates this long before they expire
    #[arg(long, env = "SELF_SIGNER_CLIENT_EXPIRY_WINDOW", default_value = "48h")]
    pub client_expiry_window: String,
}

impl GeneratorArgs {
    /// Parse durations and assemble a validated [`GeneratorConfig`].
    pub fn to_config(&self) -> Result<GeneratorConfig> {
        let mut config = GeneratorConfig::new(&self.public_service, &self.discovery_service)
            .with_key_size(self.key_size)
            .with_ca_key_reuse(self.allow_ca_key_reuse)
            .with_overwrite_files(self.overwrite_files)
            .with_pkcs8_client_key(self.pkcs8_client_key)
            .with_cluster_domain(&self.cluster_domain)
            .with_client_principal(&self.client_principal)
            .with_cert_config(
                CertRole::Ca,
                CertConfig::parse(&self.ca_duration, &self.ca_expiry_window)?,
            )
            .with_cert_config(
                CertRole::Node,
                CertConfig::parse(&self.node_duration, &self.node_expiry_window)?,
            )
            .with_cert_config(
                CertRole::Client,
                CertConfig::parse(&self.client_duration, &self.client_expiry_window)?,
            );
        if let Some(name) = &self.ca_secret {
            config = config.with_ca_secret(name);
        }

        config.validate()?;
        Ok(config)
    }
}
