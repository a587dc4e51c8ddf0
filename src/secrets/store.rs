//! The secret store interface.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::{Result, SecretsError};
use super::types::StoredSecret;

/// Narrow persistence interface used by the orchestrator.
///
/// Implementations provide optimistic concurrency: every stored secret carries
/// a version, and writes state which version they expect to replace.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret data values
/// - Annotations are not secret and may be logged
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Load a secret.
    ///
    /// Returns `Ok(None)` when the secret does not exist. Any other failure
    /// (connectivity, permissions, corrupt data) is an error.
    async fn load(&self, name: &str, namespace: &str) -> Result<Option<StoredSecret>>;

    /// Create or replace a secret, returning its new version.
    ///
    /// `expected_version` is the version observed at load time; `None` means
    /// "create only if absent".
    ///
    /// # Errors
    ///
    /// - [`SecretsError::Conflict`] if the stored version differs from
    ///   `expected_version`, or the secret exists when `None` was expected
    /// - [`SecretsError::InvalidKey`] for malformed names
    async fn create_or_update(
        &self,
        secret: &StoredSecret,
        expected_version: Option<u64>,
    ) -> Result<u64>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn load(&self, name: &str, namespace: &str) -> Result<Option<StoredSecret>> {
        (**self).load(name, namespace).await
    }

    async fn create_or_update(
        &self,
        secret: &StoredSecret,
        expected_version: Option<u64>,
    ) -> Result<u64> {
        (**self).create_or_update(secret, expected_version).await
    }
}

/// Reject names that cannot be used as a secret name or namespace.
///
/// Follows DNS-1123 subdomain rules: lowercase alphanumerics, `-` and `.`,
/// starting and ending with an alphanumeric, at most 253 characters.
pub fn validate_name(kind: &str, value: &str) -> Result<()> {
    let valid_chars =
        value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let valid_edges = value.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && value.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());

    if value.is_empty() || value.len() > 253 || !valid_chars || !valid_edges {
        return Err(SecretsError::invalid_key(
            value,
            format!("{} must be a lowercase DNS-1123 name", kind),
        ));
    }
    Ok(())
}
