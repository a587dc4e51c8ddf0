//! Domain layer
//!
//! Pure types describing what gets provisioned: the three certificate roles,
//! the secret names they are stored under, and the credential bundles moved
//! between the issuer, the readiness evaluator and the secret store.
//!
//! ## Module Organization
//!
//! - `role`: certificate roles and deterministic secret naming
//! - `bundle`: issued credential bundles and loaded CA material

pub mod bundle;
pub mod role;

pub use bundle::{CaMaterial, CredentialBundle, KeyEncoding};
pub use role::{CertRole, SecretNames};
