//! Building blocks shared by the CA, node and client steps.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CertConfig;
use crate::domain::{CertRole, CredentialBundle};
use crate::errors::{Error, Result};
use crate::readiness;
use crate::secrets::annotations::certificate_annotations;
use crate::secrets::{
    SecretStore, StoredSecret, CA_CERT_KEY, CA_PRIVATE_KEY, TLS_CERT_KEY, TLS_PRIVATE_KEY,
};

/// Result of a persistence attempt.
#[derive(Debug)]
pub(crate) enum Persisted {
    /// Our secret was written
    Written,
    /// Another writer got there first with a secret that is ready to use
    Adopted(StoredSecret),
}

pub(crate) fn ensure_not_canceled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Canceled)
    } else {
        Ok(())
    }
}

/// Load a secret, mapping store failures to [`Error::StoreAccess`].
pub(crate) async fn load_secret<S: SecretStore + ?Sized>(
    store: &S,
    cancel: &CancellationToken,
    name: &str,
    namespace: &str,
) -> Result<Option<StoredSecret>> {
    ensure_not_canceled(cancel)?;
    store
        .load(name, namespace)
        .await
        .map_err(|source| Error::StoreAccess { name: name.to_string(), source })
}

/// Run CPU-heavy issuance on the blocking pool.
///
/// Returns [`Error::Canceled`] as soon as `cancel` fires; the blocking work
/// itself runs to completion and its result is discarded.
pub(crate) async fn run_blocking<T, F>(cancel: &CancellationToken, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    ensure_not_canceled(cancel)?;
    let handle = tokio::task::spawn_blocking(work);
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Canceled),
        joined = handle => joined
            .map_err(|e| Error::key_generation(format!("issuance task failed: {}", e)))?,
    }
}

/// Secret of `role` holding `bundle`, annotated with its validity.
pub(crate) fn bundle_secret(
    role: CertRole,
    name: &str,
    namespace: &str,
    bundle: &CredentialBundle,
) -> StoredSecret {
    let secret = StoredSecret::new(name, namespace, role.secret_type()).with_annotations(
        certificate_annotations(bundle.not_before, bundle.not_after, bundle.declared_duration),
    );

    match role {
        CertRole::Ca => secret
            .with_data(CA_PRIVATE_KEY, bundle.private_key.clone())
            .with_data(CA_CERT_KEY, bundle.certificate.clone()),
        CertRole::Node | CertRole::Client => secret
            .with_data(TLS_PRIVATE_KEY, bundle.private_key.clone())
            .with_data(TLS_CERT_KEY, bundle.certificate.clone())
            .with_data(CA_CERT_KEY, bundle.ca_certificate.clone().unwrap_or_default()),
    }
}

/// Persist `secret` against the version observed at load time.
///
/// On a version conflict the secret is reloaded; if the winner is ready for
/// `role` it is adopted instead of being overwritten.
pub(crate) async fn persist<S: SecretStore + ?Sized>(
    store: &S,
    cancel: &CancellationToken,
    secret: &StoredSecret,
    expected_version: Option<u64>,
    role: CertRole,
    config: &CertConfig,
) -> Result<Persisted> {
    ensure_not_canceled(cancel)?;

    let conflict = match store.create_or_update(secret, expected_version).await {
        Ok(version) => {
            info!(
                secret = %secret.name,
                namespace = %secret.namespace,
                version,
                "Stored {} certificate secret",
                role
            );
            return Ok(Persisted::Written);
        }
        Err(e) if e.is_conflict() => e,
        Err(source) => return Err(Error::PersistenceFailed { name: secret.name.clone(), source }),
    };

    warn!(
        secret = %secret.name,
        namespace = %secret.namespace,
        error = %conflict,
        "Secret changed concurrently, reloading"
    );

    let current = load_secret(store, cancel, &secret.name, &secret.namespace).await?;
    match current {
        Some(winner) if readiness::is_ready(Some(&winner), role, config, Utc::now()) => {
            info!(
                secret = %secret.name,
                namespace = %secret.namespace,
                "Adopting {} certificate written by another run",
                role
            );
            Ok(Persisted::Adopted(winner))
        }
        _ => Err(Error::PersistenceFailed { name: secret.name.clone(), source: conflict }),
    }
}
