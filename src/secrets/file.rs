//! Directory-backed secret store.
//!
//! Each secret is one JSON document at `<root>/<namespace>/<name>.json`, data
//! values base64-encoded. Documents are written to a temporary file in the
//! same directory and renamed into place, so readers never observe a partial
//! write. Creation of a new secret uses a no-clobber rename.
//!
//! The version check and the write happen while holding `<name>.json.lock`,
//! created exclusively next to the document, so writers in other processes
//! sharing the directory see a conflict instead of overwriting each other. A
//! lock older than [`LOCK_STALE_AFTER`] is treated as left behind by a dead
//! writer and removed.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

use super::error::{Result, SecretsError};
use super::store::{validate_name, SecretStore};
use super::types::{SecretString, SecretType, StoredSecret};

/// On-disk representation of a [`StoredSecret`].
#[derive(Debug, Serialize, Deserialize)]
struct SecretDocument {
    name: String,
    namespace: String,
    #[serde(rename = "type")]
    secret_type: SecretType,
    version: u64,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

impl SecretDocument {
    fn from_secret(secret: &StoredSecret, version: u64) -> Self {
        let data = secret
            .data
            .iter()
            .map(|(key, value)| (key.clone(), STANDARD.encode(value.expose_secret())))
            .collect();

        Self {
            name: secret.name.clone(),
            namespace: secret.namespace.clone(),
            secret_type: secret.secret_type,
            version,
            annotations: secret.annotations.clone(),
            data,
        }
    }

    fn into_secret(self) -> Result<StoredSecret> {
        let mut data = BTreeMap::new();
        for (key, encoded) in self.data {
            let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                SecretsError::backend_error(format!(
                    "secret '{}' has undecodable data under '{}': {}",
                    self.name, key, e
                ))
            })?;
            let text = String::from_utf8(bytes).map_err(|_| {
                SecretsError::backend_error(format!(
                    "secret '{}' has non UTF-8 data under '{}'",
                    self.name, key
                ))
            })?;
            data.insert(key, SecretString::new(text));
        }

        Ok(StoredSecret {
            name: self.name,
            namespace: self.namespace,
            secret_type: self.secret_type,
            data,
            annotations: self.annotations,
            resource_version: Some(self.version),
        })
    }
}

/// [`SecretStore`] persisting secrets as files under a root directory.
#[derive(Debug)]
pub struct FileSecretStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), write_lock: Mutex::new(()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn secret_path(&self, name: &str, namespace: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{}.json", name))
    }
}

fn map_io_error(path: &Path, err: std::io::Error) -> SecretsError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            SecretsError::permission_denied(format!("{}: {}", path.display(), err))
        }
        _ => SecretsError::IoError(err),
    }
}

/// Age after which an update lock is considered abandoned
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(60);

/// Exclusive lock file held while one secret is checked and written.
#[derive(Debug)]
struct UpdateLock {
    path: PathBuf,
}

impl UpdateLock {
    fn acquire(dir: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| map_io_error(dir, e))?;
        let path = dir.join(format!("{}.json.lock", name));

        for _ in 0..2 {
            match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if !lock_is_stale(&path) {
                        return Err(SecretsError::conflict(
                            name,
                            "another writer is updating this secret",
                        ));
                    }
                    warn!(lock = %path.display(), "Removing abandoned secret lock");
                    match std::fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(map_io_error(&path, e)),
                    }
                }
                Err(e) => return Err(map_io_error(&path, e)),
            }
        }
        Err(SecretsError::conflict(name, "update lock is contended"))
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn lock_is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age >= LOCK_STALE_AFTER)
}

fn write_document(dir: &Path, path: &Path, contents: &[u8], create_only: bool) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| map_io_error(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| map_io_error(dir, e))?;
    tmp.write_all(contents).map_err(|e| map_io_error(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| map_io_error(tmp.path(), e))?;

    let persisted = if create_only { tmp.persist_noclobber(path) } else { tmp.persist(path) };
    match persisted {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(SecretsError::conflict(path.display().to_string(), "already exists"))
        }
        Err(e) => Err(map_io_error(path, e.error)),
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn load(&self, name: &str, namespace: &str) -> Result<Option<StoredSecret>> {
        validate_name("secret name", name)?;
        validate_name("namespace", namespace)?;

        let path = self.secret_path(name, namespace);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io_error(&path, e)),
        };

        let document: SecretDocument = serde_json::from_slice(&raw)?;
        document.into_secret().map(Some)
    }

    async fn create_or_update(
        &self,
        secret: &StoredSecret,
        expected_version: Option<u64>,
    ) -> Result<u64> {
        validate_name("secret name", &secret.name)?;
        validate_name("namespace", &secret.namespace)?;

        let _guard = self.write_lock.lock().await;

        let dir = self.root.join(&secret.namespace);
        let _lock = {
            let dir = dir.clone();
            let name = secret.name.clone();
            tokio::task::spawn_blocking(move || UpdateLock::acquire(&dir, &name))
                .await
                .map_err(|e| SecretsError::backend_error(format!("lock task failed: {}", e)))??
        };

        let current = self.load(&secret.name, &secret.namespace).await?;
        let next = match (current.and_then(|s| s.resource_version), expected_version) {
            (None, None) => 1,
            (Some(found), Some(expected)) if found == expected => found + 1,
            (Some(found), expected) => {
                return Err(SecretsError::conflict(
                    &secret.name,
                    format!("expected version {:?} but found {}", expected, found),
                ))
            }
            (None, Some(expected)) => {
                return Err(SecretsError::conflict(
                    &secret.name,
                    format!("expected version {} but the secret no longer exists", expected),
                ))
            }
        };

        let contents = serde_json::to_vec_pretty(&SecretDocument::from_secret(secret, next))?;
        let path = self.secret_path(&secret.name, &secret.namespace);
        let create_only = expected_version.is_none();

        tokio::task::spawn_blocking(move || write_document(&dir, &path, &contents, create_only))
            .await
            .map_err(|e| SecretsError::backend_error(format!("write task failed: {}", e)))??;

        tracing::debug!(
            secret = %secret.name,
            namespace = %secret.namespace,
            version = next,
            root = %self.root.display(),
            "Stored secret on disk"
        );
        Ok(next)
    }
}
