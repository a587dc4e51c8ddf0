//! X.509 issuance for the cluster's CA, node and client certificates.
//!
//! Keys are RSA (PKCS#1 by default, PKCS#8 optional for client keys), signed
//! with SHA-256. Certificate construction goes through `rcgen`; parsing back
//! for verification goes through `x509-parser`.

pub mod hosts;
pub mod info;
pub mod issuer;
pub mod keys;

pub use hosts::HostSet;
pub use info::{verify_issued_by, CertificateInfo};
pub use issuer::{issue_ca, issue_client, issue_node, CA_COMMON_NAME, NODE_COMMON_NAME};
