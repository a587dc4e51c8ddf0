//! # Structured Logging
//!
//! `tracing` subscriber setup for the binary. The filter comes from `RUST_LOG`
//! when set, otherwise `info` (or `debug` with `--verbose`). JSON output is
//! available for log shippers. Logs are written to stderr.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::GeneratorConfig;

/// Logging options taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOptions {
    pub verbose: bool,
    pub json: bool,
}

impl LoggingOptions {
    pub fn default_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_level()))
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(options: LoggingOptions) -> bool {
    let builder = FmtSubscriber::builder()
        .with_env_filter(options.env_filter())
        .with_writer(std::io::stderr);
    let installed = if options.json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.is_ok()
}

/// Log the effective run configuration. Never includes key material.
pub fn log_run_config(config: &GeneratorConfig, namespace: &str) {
    tracing::info!(
        namespace = %namespace,
        key_size = config.key_size,
        ca_duration = %config.ca.duration_string(),
        node_duration = %config.node.duration_string(),
        client_duration = %config.client.duration_string(),
        cluster_domain = %config.cluster_domain,
        user_ca_secret = ?config.ca_secret,
        allow_ca_key_reuse = config.allow_ca_key_reuse,
        pkcs8_client_key = config.pkcs8_client_key,
        "Certificate generator configuration"
    );
}
