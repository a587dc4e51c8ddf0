use self_signer::secrets::{SecretType, CA_CERT_KEY};
use self_signer::{CertRole, Error, GeneratorConfig, Orchestrator, StoredSecret};
use tokio_util::sync::CancellationToken;

use super::support::{config, StoreOp, TestStore, NAMESPACE};

#[tokio::test]
async fn ca_store_failure_stops_before_node_and_client() {
    let store = TestStore::new().failing_load("crdb-ca-secret");
    let orchestrator = Orchestrator::new(store.clone(), config()).unwrap();

    let err = orchestrator.run(&CancellationToken::new(), NAMESPACE).await.unwrap_err();

    assert_eq!(err.stage(), Some(CertRole::Ca));
    assert!(matches!(err.root(), Error::StoreAccess { name, .. } if name == "crdb-ca-secret"));
    assert!(err.to_string().starts_with("error generating CA certificate"));
    assert_eq!(store.ops(), vec![StoreOp::Load("crdb-ca-secret".to_string())]);
}

#[tokio::test]
async fn incomplete_user_ca_is_rejected_without_generation() {
    let store = TestStore::new();
    store
        .inner()
        .insert(
            StoredSecret::new("my-ca", NAMESPACE, SecretType::Opaque)
                .with_data(CA_CERT_KEY, "-----BEGIN CERTIFICATE-----\n"),
        )
        .await;
    let orchestrator = Orchestrator::new(store.clone(), config().with_ca_secret("my-ca")).unwrap();

    let err = orchestrator.run(&CancellationToken::new(), NAMESPACE).await.unwrap_err();

    assert_eq!(err.stage(), Some(CertRole::Ca));
    match err.root() {
        Error::MissingCredentialMaterial { name, missing } => {
            assert_eq!(name, "my-ca");
            assert!(missing.contains("ca.key"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.writes().is_empty());
    assert_eq!(store.inner().len().await, 1);
}

#[tokio::test]
async fn missing_user_ca_is_rejected() {
    let store = TestStore::new();
    let orchestrator = Orchestrator::new(store.clone(), config().with_ca_secret("my-ca")).unwrap();

    let err = orchestrator.run(&CancellationToken::new(), NAMESPACE).await.unwrap_err();

    assert!(matches!(err.root(), Error::MissingCredentialMaterial { .. }));
    assert!(store.inner().is_empty().await);
}

#[tokio::test]
async fn unusable_names_are_rejected_before_any_io() {
    let store = TestStore::new();

    for config in [
        GeneratorConfig::new("crdb-public", "CRDB_Bad"),
        config().with_client_principal("ops/admin"),
        config().with_ca_secret("My_CA"),
    ] {
        let err = Orchestrator::new(store.clone(), config).err().unwrap();
        assert!(matches!(err, Error::ConfigParse(_)), "unexpected error: {err}");
    }
    assert!(store.ops().is_empty());
}

#[tokio::test]
async fn canceled_run_touches_nothing() {
    let store = TestStore::new();
    let orchestrator = Orchestrator::new(store.clone(), config()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator.run(&cancel, NAMESPACE).await.unwrap_err();

    assert!(err.is_canceled());
    assert!(store.ops().is_empty());
}

#[tokio::test]
async fn node_write_failure_is_a_persistence_error() {
    let store = TestStore::new().failing_write("crdb-node-secret");
    let orchestrator = Orchestrator::new(store.clone(), config()).unwrap();

    let err = orchestrator.run(&CancellationToken::new(), NAMESPACE).await.unwrap_err();

    assert_eq!(err.stage(), Some(CertRole::Node));
    assert!(matches!(err.root(), Error::PersistenceFailed { name, .. } if name == "crdb-node-secret"));
    assert_eq!(store.writes(), vec!["crdb-ca-secret", "crdb-node-secret"]);
    assert!(!store.ops().contains(&StoreOp::Load("crdb-client-secret".to_string())));

    // The CA made it; a rerun picks it up and retries only the failed stages.
    let retry = Orchestrator::new(store.inner().clone(), config()).unwrap();
    let report = retry.run(&CancellationToken::new(), NAMESPACE).await.unwrap();
    assert_eq!(report.generated(), vec![CertRole::Node, CertRole::Client]);
}
