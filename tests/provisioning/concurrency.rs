use self_signer::secrets::{CA_CERT_KEY, TLS_CERT_KEY};
use self_signer::{CertConfig, CertRole, Error, InMemorySecretStore, Orchestrator, StepOutcome};
use tokio_util::sync::CancellationToken;

use super::support::{config, data, TestStore, NAMESPACE};

/// Secrets produced by an independent run, used as the competing writer.
async fn competitor(config: self_signer::GeneratorConfig) -> InMemorySecretStore {
    let store = InMemorySecretStore::new();
    Orchestrator::new(store.clone(), config)
        .unwrap()
        .run(&CancellationToken::new(), NAMESPACE)
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn concurrently_created_ca_is_adopted() {
    let other = competitor(config()).await;
    let winner = self_signer::SecretStore::load(&other, "crdb-ca-secret", NAMESPACE)
        .await
        .unwrap()
        .unwrap();

    let store = TestStore::new().racing_with(winner.clone());
    let report = Orchestrator::new(store.clone(), config())
        .unwrap()
        .run(&CancellationToken::new(), NAMESPACE)
        .await
        .unwrap();

    assert_eq!(report.outcome(CertRole::Ca), Some(StepOutcome::Reused));
    assert_eq!(report.outcome(CertRole::Node), Some(StepOutcome::Generated));

    let ca = store.get("crdb-ca-secret").await;
    assert_eq!(data(&ca, CA_CERT_KEY), data(&winner, CA_CERT_KEY));
    assert_eq!(ca.resource_version, Some(1));

    // Leaves are signed by the adopted CA, not by the discarded one.
    let node = store.get("crdb-node-secret").await;
    self_signer::pki::verify_issued_by(&data(&node, TLS_CERT_KEY), &data(&winner, CA_CERT_KEY))
        .unwrap();
}

#[tokio::test]
async fn concurrently_created_stale_secret_is_a_conflict() {
    let other = competitor(
        config().with_cert_config(CertRole::Client, CertConfig::parse("96h", "48h").unwrap()),
    )
    .await;
    let stale = self_signer::SecretStore::load(&other, "crdb-client-secret", NAMESPACE)
        .await
        .unwrap()
        .unwrap();

    let store = TestStore::new().racing_with(stale);
    let err = Orchestrator::new(store.clone(), config())
        .unwrap()
        .run(&CancellationToken::new(), NAMESPACE)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(CertRole::Client));
    match err.root() {
        Error::PersistenceFailed { name, source } => {
            assert_eq!(name, "crdb-client-secret");
            assert!(source.is_conflict());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        store.get("crdb-client-secret").await.annotations["duration"],
        "96h0m0s"
    );
}
