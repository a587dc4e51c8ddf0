use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use self_signer::pki::CertificateInfo;
use self_signer::secrets::{Result as StoreResult, SecretsError};
use self_signer::{GeneratorConfig, InMemorySecretStore, SecretStore, StoredSecret};

pub const NAMESPACE: &str = "ns1";

/// Chart defaults for a cluster exposed as `crdb-public` with discovery service `crdb`.
pub fn config() -> GeneratorConfig {
    GeneratorConfig::new("crdb-public", "crdb")
}

/// Store operation observed by [`TestStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Load(String),
    Write(String),
}

/// In-memory store that records every call and can inject failures.
#[derive(Clone, Default)]
pub struct TestStore {
    inner: InMemorySecretStore,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    fail_load: Option<String>,
    fail_write: Option<String>,
    racer: Arc<Mutex<Option<StoredSecret>>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads of `name` fail with a connection error.
    pub fn failing_load(mut self, name: &str) -> Self {
        self.fail_load = Some(name.to_string());
        self
    }

    /// Writes of `name` fail with a backend error.
    pub fn failing_write(mut self, name: &str) -> Self {
        self.fail_write = Some(name.to_string());
        self
    }

    /// Right before the first write of `secret.name`, another writer stores `secret`.
    pub fn racing_with(self, secret: StoredSecret) -> Self {
        *self.racer.lock().unwrap() = Some(secret);
        self
    }

    pub fn inner(&self) -> &InMemorySecretStore {
        &self.inner
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Write(name) => Some(name),
                StoreOp::Load(_) => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub async fn get(&self, name: &str) -> StoredSecret {
        self.inner
            .load(name, NAMESPACE)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("secret {name} not stored"))
    }
}

#[async_trait]
impl SecretStore for TestStore {
    async fn load(&self, name: &str, namespace: &str) -> StoreResult<Option<StoredSecret>> {
        self.ops.lock().unwrap().push(StoreOp::Load(name.to_string()));
        if self.fail_load.as_deref() == Some(name) {
            return Err(SecretsError::connection_failed("store unreachable"));
        }
        self.inner.load(name, namespace).await
    }

    async fn create_or_update(
        &self,
        secret: &StoredSecret,
        expected_version: Option<u64>,
    ) -> StoreResult<u64> {
        self.ops.lock().unwrap().push(StoreOp::Write(secret.name.clone()));
        if self.fail_write.as_deref() == Some(secret.name.as_str()) {
            return Err(SecretsError::backend_error("disk full"));
        }

        let racer = {
            let mut racer = self.racer.lock().unwrap();
            match racer.as_ref() {
                Some(r) if r.name == secret.name => racer.take(),
                _ => None,
            }
        };
        if let Some(racer) = racer {
            self.inner.insert(racer).await;
        }

        self.inner.create_or_update(secret, expected_version).await
    }
}

/// Data value of `secret` under `key`, which must be present.
pub fn data(secret: &StoredSecret, key: &str) -> String {
    secret
        .value(key)
        .unwrap_or_else(|| panic!("{} has no {}", secret.name, key))
        .expose_secret()
        .to_string()
}

pub fn cert_info(secret: &StoredSecret, key: &str) -> CertificateInfo {
    CertificateInfo::from_pem(&data(secret, key)).unwrap()
}
