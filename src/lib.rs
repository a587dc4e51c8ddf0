//! # Self-Signer
//!
//! Provisions and rotates the TLS material of a secure database cluster: one
//! self-signed CA, a node certificate shared by every node, and a client
//! certificate for the administrative principal. Each bundle is kept in a
//! named secret and regenerated only when it is missing, incomplete, issued
//! with a different duration, or inside its renewal window.
//!
//! ## Architecture
//!
//! ```text
//! CLI ─► GeneratorConfig ─► Orchestrator ─► CaManager ─► pki::issuer
//!                               │                │
//!                               └─ readiness ◄───┴─► SecretStore
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use self_signer::{GeneratorConfig, InMemorySecretStore, Orchestrator, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = GeneratorConfig::new("crdb-public", "crdb");
//!     let orchestrator = Orchestrator::new(InMemorySecretStore::new(), config)?;
//!     let report = orchestrator.run(&CancellationToken::new(), "default").await?;
//!     println!("{:?}", report.generated());
//!     Ok(())
//! }
//! ```

pub mod ca;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod orchestrator;
pub mod pki;
pub mod readiness;
pub mod secrets;
pub mod workdir;

mod provision;

// Re-export commonly used types and traits
pub use ca::{CaManager, CaSource};
pub use config::{CertConfig, GeneratorConfig};
pub use domain::{CaMaterial, CertRole, CredentialBundle, KeyEncoding, SecretNames};
pub use errors::{Error, Result};
pub use orchestrator::{Orchestrator, RoleStatus, RunReport, StepOutcome, StepReport};
pub use readiness::Readiness;
pub use secrets::{FileSecretStore, InMemorySecretStore, SecretStore, StoredSecret};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
