//! # Configuration Management
//!
//! Configuration is parsed and validated once, before any secret is touched,
//! and then handed to the orchestrator as an immutable [`GeneratorConfig`].

pub mod cert;
pub mod duration;
pub mod settings;

pub use cert::CertConfig;
pub use duration::{format_duration, parse_duration};
pub use settings::{
    GeneratorConfig, DEFAULT_CLIENT_PRINCIPAL, DEFAULT_CLUSTER_DOMAIN, DEFAULT_KEY_SIZE,
    MAX_KEY_SIZE, MIN_KEY_SIZE,
};
