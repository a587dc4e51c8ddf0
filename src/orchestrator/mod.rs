//! # Orchestrator
//!
//! Drives one provisioning run for a namespace:
//!
//! ```text
//! CA ──► Node ──► Client
//!  │       │        │
//!  └─ load ─► readiness ─► reuse | issue ─► persist (versioned) ─► report
//! ```
//!
//! Stages run strictly in order and the run stops at the first failure, which
//! is reported wrapped in [`Error::Stage`]. A fresh [`WorkDir`] holds the raw
//! key material for the duration of the run and is removed on every exit
//! path.

mod report;

pub use report::{RoleStatus, RunReport, StepOutcome, StepReport};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::ca::CaManager;
use crate::config::GeneratorConfig;
use crate::domain::{CaMaterial, CertRole, CredentialBundle};
use crate::errors::{Error, Result};
use crate::pki::issuer;
use crate::provision::{self, Persisted};
use crate::readiness;
use crate::secrets::annotations::{self, NOT_AFTER};
use crate::secrets::store::validate_name;
use crate::secrets::SecretStore;
use crate::workdir::WorkDir;

/// Provisions CA, node and client certificates into a [`SecretStore`].
pub struct Orchestrator<S> {
    store: S,
    config: GeneratorConfig,
}

impl<S: SecretStore> Orchestrator<S> {
    /// Validates `config` up front so no run starts with bad settings.
    pub fn new(store: S, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run CA, node and client provisioning in `namespace`.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn run(&self, cancel: &CancellationToken, namespace: &str) -> Result<RunReport> {
        provision::ensure_not_canceled(cancel)?;
        validate_name("namespace", namespace).map_err(|e| Error::config(e.to_string()))?;

        let workdir = WorkDir::new(self.config.overwrite_files)?;
        debug!(dir = %workdir.path().display(), "Created working directory");

        let mut steps = Vec::with_capacity(CertRole::ALL.len());
        for role in CertRole::ALL {
            let step = self.run_stage(cancel, namespace, &workdir, role).await.map_err(|e| {
                if !e.is_canceled() {
                    error!(stage = %role, error = %e, "Certificate stage failed");
                }
                e.in_stage(role)
            })?;
            steps.push(step);
        }
        workdir.close()?;

        info!(
            generated = ?steps
                .iter()
                .filter(|s| s.outcome == StepOutcome::Generated)
                .map(|s| s.role.as_str())
                .collect::<Vec<_>>(),
            "Certificate provisioning complete"
        );
        Ok(RunReport { namespace: namespace.to_string(), steps })
    }

    /// Readiness of the three secrets without changing anything.
    pub async fn status(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
    ) -> Result<Vec<RoleStatus>> {
        validate_name("namespace", namespace).map_err(|e| Error::config(e.to_string()))?;

        let names = self.config.secret_names();
        let now = Utc::now();
        let mut statuses = Vec::with_capacity(CertRole::ALL.len());

        for role in CertRole::ALL {
            let user_ca = match role {
                CertRole::Ca => self.config.ca_secret.clone(),
                _ => None,
            };
            let secret_name = user_ca.clone().unwrap_or_else(|| names.for_role(role));
            let secret = provision::load_secret(&self.store, cancel, &secret_name, namespace)
                .await
                .map_err(|e| e.in_stage(role))?;

            let readiness = match user_ca {
                Some(_) => readiness::evaluate_material(secret.as_ref(), role),
                None => readiness::evaluate(
                    secret.as_ref(),
                    role,
                    self.config.cert_config(role),
                    now,
                ),
            };
            let not_after =
                secret.as_ref().and_then(|s| annotations::parse_timestamp(&s.annotations, NOT_AFTER));

            statuses.push(RoleStatus { role, secret_name, readiness, not_after });
        }
        Ok(statuses)
    }

    async fn run_stage(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        workdir: &WorkDir,
        role: CertRole,
    ) -> Result<StepReport> {
        let key_size = self.config.key_size;
        let validity = self.config.cert_config(role).duration;

        match role {
            CertRole::Ca => {
                let ensured =
                    CaManager::new(&self.store, &self.config).ensure_ca(cancel, namespace, workdir).await?;
                Ok(StepReport {
                    role,
                    secret_name: ensured.secret_name,
                    outcome: ensured.source.into(),
                })
            }
            CertRole::Node => {
                let hosts = self.config.host_set(namespace);
                debug!(hosts = ?hosts.as_slice(), "Node certificate hosts");
                self.ensure_leaf(cancel, namespace, workdir, role, "node", move |ca| {
                    issuer::issue_node(&ca, &hosts, key_size, validity)
                })
                .await
            }
            CertRole::Client => {
                let principal = self.config.client_principal.clone();
                let encoding = self.config.client_key_encoding();
                let stem = format!("client.{}", principal);
                self.ensure_leaf(cancel, namespace, workdir, role, &stem, move |ca| {
                    issuer::issue_client(&ca, &principal, key_size, validity, encoding)
                })
                .await
            }
        }
    }

    /// Reuse the role's secret when ready, otherwise issue with `issue` against
    /// the CA in `workdir` and persist the result.
    async fn ensure_leaf<F>(
        &self,
        cancel: &CancellationToken,
        namespace: &str,
        workdir: &WorkDir,
        role: CertRole,
        file_stem: &str,
        issue: F,
    ) -> Result<StepReport>
    where
        F: FnOnce(CaMaterial) -> Result<CredentialBundle> + Send + 'static,
    {
        let name = self.config.secret_names().for_role(role);
        let config = self.config.cert_config(role);

        let existing = provision::load_secret(&self.store, cancel, &name, namespace).await?;
        let readiness = readiness::evaluate(existing.as_ref(), role, config, Utc::now());
        if readiness.is_ready() {
            info!(secret = %name, "{} certificate is up to date, reusing it", role);
            return Ok(StepReport { role, secret_name: name, outcome: StepOutcome::Reused });
        }
        info!(secret = %name, readiness = %readiness, "Generating {} certificate", role);

        provision::ensure_not_canceled(cancel)?;
        let ca = workdir.read_ca().await?;
        let bundle = provision::run_blocking(cancel, move || issue(ca)).await?;
        debug!(
            not_before = %bundle.not_before,
            not_after = %bundle.not_after,
            "Issued {} certificate",
            role
        );

        provision::ensure_not_canceled(cancel)?;
        workdir.write_bundle(file_stem, &bundle).await?;

        let secret = provision::bundle_secret(role, &name, namespace, &bundle);
        let expected_version = existing.as_ref().and_then(|s| s.resource_version);
        let outcome =
            match provision::persist(&self.store, cancel, &secret, expected_version, role, config)
                .await?
            {
                Persisted::Written => StepOutcome::Generated,
                Persisted::Adopted(_) => StepOutcome::Reused,
            };

        Ok(StepReport { role, secret_name: name, outcome })
    }
}
