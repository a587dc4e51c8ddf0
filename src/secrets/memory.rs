//! In-memory secret store.
//!
//! Holds secrets in a process-local map. Used by tests and by `--dry-run`
//! invocations that should exercise the full provisioning path without
//! persisting anything.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{Result, SecretsError};
use super::store::{validate_name, SecretStore};
use super::types::StoredSecret;

type SecretKey = (String, String);

/// In-memory [`SecretStore`] with per-secret versions.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<HashMap<SecretKey, StoredSecret>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets across all namespaces
    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }

    /// Insert a secret unconditionally, bumping its version.
    ///
    /// Intended for seeding fixtures, e.g. a user-managed CA secret.
    pub async fn insert(&self, mut secret: StoredSecret) -> u64 {
        let mut secrets = self.secrets.write().await;
        let key = (secret.namespace.clone(), secret.name.clone());
        let version = secrets.get(&key).and_then(|s| s.resource_version).unwrap_or(0) + 1;
        secret.resource_version = Some(version);
        secrets.insert(key, secret);
        version
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn load(&self, name: &str, namespace: &str) -> Result<Option<StoredSecret>> {
        let secrets = self.secrets.read().await;
        Ok(secrets.get(&(namespace.to_string(), name.to_string())).cloned())
    }

    async fn create_or_update(
        &self,
        secret: &StoredSecret,
        expected_version: Option<u64>,
    ) -> Result<u64> {
        validate_name("secret name", &secret.name)?;
        validate_name("namespace", &secret.namespace)?;

        let mut secrets = self.secrets.write().await;
        let key = (secret.namespace.clone(), secret.name.clone());
        let current = secrets.get(&key).and_then(|s| s.resource_version);

        let next = match (current, expected_version) {
            (None, None) => 1,
            (Some(found), Some(expected)) if found == expected => found + 1,
            (Some(found), None) => {
                return Err(SecretsError::conflict(
                    &secret.name,
                    format!("already exists at version {}", found),
                ))
            }
            (Some(found), Some(expected)) => {
                return Err(SecretsError::conflict(
                    &secret.name,
                    format!("expected version {} but found {}", expected, found),
                ))
            }
            (None, Some(expected)) => {
                return Err(SecretsError::conflict(
                    &secret.name,
                    format!("expected version {} but the secret no longer exists", expected),
                ))
            }
        };

        let mut stored = secret.clone();
        stored.resource_version = Some(next);
        secrets.insert(key, stored);

        tracing::debug!(
            secret = %secret.name,
            namespace = %secret.namespace,
            version = next,
            "Stored secret in memory"
        );
        Ok(next)
    }
}
