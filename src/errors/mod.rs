//! # Error Handling
//!
//! Error taxonomy for certificate provisioning. Every failure inside an
//! orchestration run is wrapped in [`Error::Stage`] naming the role (CA, Node,
//! Client) that failed; [`Error::root`] peels the wrappers off again so callers
//! can classify the underlying cause.

use crate::domain::CertRole;
use crate::secrets::SecretsError;

/// Custom result type for certificate provisioning
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the self-signer
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid configuration (bad duration strings, unsupported key sizes, ...)
    #[error("Configuration error: {0}")]
    ConfigParse(String),

    /// The secret store could not be read (distinct from "not found")
    #[error("Failed to access secret '{name}': {source}")]
    StoreAccess {
        name: String,
        #[source]
        source: SecretsError,
    },

    /// A user supplied CA secret lacks its key or certificate
    #[error("Secret '{name}' is missing credential material: {missing}")]
    MissingCredentialMaterial { name: String, missing: String },

    /// RSA key generation or key decoding failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Building or signing a certificate failed
    #[error("Certificate signing failed: {0}")]
    SigningFailed(String),

    /// Material was generated but could not be saved
    #[error("Failed to persist secret '{name}': {source}")]
    PersistenceFailed {
        name: String,
        #[source]
        source: SecretsError,
    },

    /// A certificate could not be parsed
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Working-area I/O errors
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was canceled by the caller
    #[error("Operation canceled")]
    Canceled,

    /// A failure attributed to one orchestration stage
    #[error("error generating {stage} certificate: {source}")]
    Stage {
        stage: CertRole,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigParse(message.into())
    }

    /// Create a key generation error
    pub fn key_generation<S: Into<String>>(message: S) -> Self {
        Self::KeyGenerationFailed(message.into())
    }

    /// Create a signing error
    pub fn signing<S: Into<String>>(message: S) -> Self {
        Self::SigningFailed(message.into())
    }

    /// Create a certificate parsing error
    pub fn certificate<S: Into<String>>(message: S) -> Self {
        Self::Certificate(message.into())
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Create a missing credential material error
    pub fn missing_material<N: Into<String>, M: Into<String>>(name: N, missing: M) -> Self {
        Self::MissingCredentialMaterial { name: name.into(), missing: missing.into() }
    }

    /// Attribute this error to an orchestration stage
    pub fn in_stage(self, stage: CertRole) -> Self {
        Self::Stage { stage, source: Box::new(self) }
    }

    /// The stage this error was raised in, if it has been attributed to one
    pub fn stage(&self) -> Option<CertRole> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, with all stage wrappers removed
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the underlying cause is a cancellation
    pub fn is_canceled(&self) -> bool {
        matches!(self.root(), Self::Canceled)
    }
}
