//! Obtain the CA key and certificate every other certificate is signed with.
//!
//! Either the CA is user-managed (a named secret that must already hold
//! `ca.key` and `ca.crt`; nothing is ever generated for it) or it is owned by
//! this tool and lives in the canonical `<discovery>-ca-secret`, generated on
//! first use and regenerated once it falls inside its renewal window.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::GeneratorConfig;
use crate::domain::{CaMaterial, CertRole};
use crate::errors::{Error, Result};
use crate::pki::{issuer, keys, CertificateInfo};
use crate::provision::{self, Persisted};
use crate::readiness::{self, Readiness};
use crate::secrets::{SecretStore, SecretString, StoredSecret, CA_CERT_KEY, CA_PRIVATE_KEY};
use crate::workdir::WorkDir;

/// How the CA material for this run was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaSource {
    /// User-managed secret, used as is
    UserSupplied,
    /// Existing canonical secret still valid
    Reused,
    /// Freshly generated and persisted by this run
    Generated,
    /// Generated concurrently by another run and adopted
    Adopted,
}

/// Outcome of [`CaManager::ensure_ca`].
#[derive(Debug)]
pub struct EnsuredCa {
    pub secret_name: String,
    pub source: CaSource,
    pub material: CaMaterial,
}

/// Resolves CA material for one namespace against a [`SecretStore`].
pub struct CaManager<'a, S: ?Sized> {
    store: &'a S,
    config: &'a GeneratorConfig,
}

impl<'a, S: SecretStore + ?Sized> CaManager<'a, S> {
    pub fn new(store: &'a S, config: &'a GeneratorConfig) -> Self {
        Self { store, config }
    }

    /// Make sure a usable CA exists, persisting a new one at most once, and
    /// write `ca.crt` / `ca.key` into `workdir`.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn ensure_ca(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        workdir: &WorkDir,
    ) -> Result<EnsuredCa> {
        let ensured = match &self.config.ca_secret {
            Some(name) => self.load_user_supplied(cancel, namespace, name).await?,
            None => self.ensure_managed(cancel, namespace).await?,
        };

        provision::ensure_not_canceled(cancel)?;
        workdir.write_ca(&ensured.material).await?;
        debug!(secret = %ensured.secret_name, dir = %workdir.path().display(), "Wrote CA material");
        Ok(ensured)
    }

    async fn load_user_supplied(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        name: &str,
    ) -> Result<EnsuredCa> {
        let secret = provision::load_secret(self.store, cancel, name, namespace)
            .await?
            .ok_or_else(|| Error::missing_material(name, "secret not found"))?;

        if let Readiness::PresentStale(reason) =
            readiness::evaluate_material(Some(&secret), CertRole::Ca)
        {
            return Err(Error::missing_material(name, reason.to_string()));
        }

        let material = material_from_secret(&secret)?;
        let info = CertificateInfo::from_pem(&material.cert_pem)?;
        if !info.is_ca {
            return Err(Error::certificate(format!(
                "certificate in secret '{}' is not a CA certificate",
                name
            )));
        }

        info!(secret = %name, not_after = %info.not_after, "Using user-supplied CA");
        Ok(EnsuredCa { secret_name: name.to_string(), source: CaSource::UserSupplied, material })
    }

    async fn ensure_managed(&self, cancel: &CancellationToken, namespace: &str) -> Result<EnsuredCa> {
        let name = self.config.secret_names().ca();
        let existing = provision::load_secret(self.store, cancel, &name, namespace).await?;

        let readiness =
            readiness::evaluate(existing.as_ref(), CertRole::Ca, &self.config.ca, Utc::now());
        if let (Readiness::PresentReady, Some(secret)) = (&readiness, &existing) {
            info!(secret = %name, "CA certificate is up to date, reusing it");
            return Ok(EnsuredCa {
                material: material_from_secret(secret)?,
                secret_name: name,
                source: CaSource::Reused,
            });
        }

        info!(secret = %name, readiness = %readiness, "Generating CA certificate");

        let reused_key = self.reusable_key(existing.as_ref());
        let key_size = self.config.key_size;
        let validity = self.config.ca.duration;
        let bundle = provision::run_blocking(cancel, move || {
            let key = match reused_key {
                Some(pem) => match keys::decode_private_key(pem.expose_secret()) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        warn!(error = %e, "Existing CA key is unusable, generating a new one");
                        None
                    }
                },
                None => None,
            };
            issuer::issue_ca(key, key_size, validity)
        })
        .await?;
        debug!(
            not_before = %bundle.not_before,
            not_after = %bundle.not_after,
            "Issued CA certificate"
        );

        let secret = provision::bundle_secret(CertRole::Ca, &name, namespace, &bundle);
        let expected_version = existing.as_ref().and_then(|s| s.resource_version);
        let persisted = provision::persist(
            self.store,
            cancel,
            &secret,
            expected_version,
            CertRole::Ca,
            &self.config.ca,
        )
        .await?;

        match persisted {
            Persisted::Written => Ok(EnsuredCa {
                material: CaMaterial::from(&bundle),
                secret_name: name,
                source: CaSource::Generated,
            }),
            Persisted::Adopted(winner) => Ok(EnsuredCa {
                material: material_from_secret(&winner)?,
                secret_name: name,
                source: CaSource::Adopted,
            }),
        }
    }

    fn reusable_key(&self, existing: Option<&StoredSecret>) -> Option<SecretString> {
        if !self.config.allow_ca_key_reuse {
            return None;
        }
        let key = existing?.value(CA_PRIVATE_KEY)?.clone();
        debug!("Reusing existing CA private key");
        Some(key)
    }
}

fn material_from_secret(secret: &StoredSecret) -> Result<CaMaterial> {
    let key = secret
        .value(CA_PRIVATE_KEY)
        .ok_or_else(|| Error::missing_material(&secret.name, CA_PRIVATE_KEY))?;
    let cert = secret
        .value(CA_CERT_KEY)
        .ok_or_else(|| Error::missing_material(&secret.name, CA_CERT_KEY))?;
    Ok(CaMaterial::new(key.clone(), cert.expose_secret()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{InMemorySecretStore, SecretType};

    fn config() -> GeneratorConfig {
        GeneratorConfig::new("crdb-public", "crdb")
    }

    #[tokio::test]
    async fn test_generates_then_reuses() {
        let store = InMemorySecretStore::new();
        let config = config();
        let manager = CaManager::new(&store, &config);
        let cancel = CancellationToken::new();

        let workdir = WorkDir::new(false).unwrap();
        let first = manager.ensure_ca(&cancel, "ns1", &workdir).await.unwrap();
        assert_eq!(first.source, CaSource::Generated);
        assert_eq!(first.secret_name, "crdb-ca-secret");

        let stored = store.load("crdb-ca-secret", "ns1").await.unwrap().unwrap();
        assert_eq!(stored.secret_type, SecretType::Opaque);
        assert_eq!(stored.annotations.get("duration").map(String::as_str), Some("43800h0m0s"));

        let workdir = WorkDir::new(false).unwrap();
        let second = manager.ensure_ca(&cancel, "ns1", &workdir).await.unwrap();
        assert_eq!(second.source, CaSource::Reused);
        assert_eq!(second.material.cert_pem, first.material.cert_pem);
        assert_eq!(workdir.read_ca().await.unwrap().cert_pem, first.material.cert_pem);
    }

    #[tokio::test]
    async fn test_missing_user_secret_is_not_generated() {
        let store = InMemorySecretStore::new();
        let config = config().with_ca_secret("my-ca");
        let manager = CaManager::new(&store, &config);

        let workdir = WorkDir::new(false).unwrap();
        let err =
            manager.ensure_ca(&CancellationToken::new(), "ns1", &workdir).await.unwrap_err();

        assert!(matches!(err, Error::MissingCredentialMaterial { ref name, .. } if name == "my-ca"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_user_secret_without_key_is_rejected() {
        let store = InMemorySecretStore::new();
        store
            .insert(
                StoredSecret::new("my-ca", "ns1", SecretType::Opaque)
                    .with_data(CA_CERT_KEY, "-----BEGIN CERTIFICATE-----"),
            )
            .await;
        let config = config().with_ca_secret("my-ca");

        let workdir = WorkDir::new(false).unwrap();
        let err = CaManager::new(&store, &config)
            .ensure_ca(&CancellationToken::new(), "ns1", &workdir)
            .await
            .unwrap_err();

        match err {
            Error::MissingCredentialMaterial { missing, .. } => assert!(missing.contains("ca.key")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_canceled_before_load() {
        let store = InMemorySecretStore::new();
        let config = config();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let workdir = WorkDir::new(false).unwrap();
        let err = CaManager::new(&store, &config).ensure_ca(&cancel, "ns1", &workdir).await;

        assert!(matches!(err, Err(Error::Canceled)));
        assert!(store.is_empty().await);
    }
}
