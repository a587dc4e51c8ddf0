//! Secret store abstraction for generated certificate material.
//!
//! The orchestrator only ever talks to the [`SecretStore`] trait:
//! - **load**: fetch a named secret, `None` when absent
//! - **create_or_update**: persist a secret against the version observed at load
//!
//! # Supported Backends
//!
//! - **In-memory**: process-local map, for tests and dry runs
//! - **File**: one JSON document per secret under a root directory
//!
//! # Security Considerations
//!
//! - Private keys are held in [`SecretString`] and never logged
//! - Annotations carry validity metadata only and are safe to log

pub mod annotations;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{Result, SecretsError};
pub use file::FileSecretStore;
pub use memory::InMemorySecretStore;
pub use store::SecretStore;
pub use types::{
    SecretString, SecretType, StoredSecret, CA_CERT_KEY, CA_PRIVATE_KEY, TLS_CERT_KEY,
    TLS_PRIVATE_KEY,
};
