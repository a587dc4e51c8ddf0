//! Decide whether a stored certificate secret can be reused as is.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::{format_duration, CertConfig};
use crate::domain::CertRole;
use crate::secrets::annotations::{self, NOT_AFTER, NOT_BEFORE};
use crate::secrets::{StoredSecret, CA_CERT_KEY, CA_PRIVATE_KEY, TLS_CERT_KEY, TLS_PRIVATE_KEY};

/// State of one role's secret against the current configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// No secret under the expected name
    Absent,
    /// Complete and valid past the renewal window
    PresentReady,
    /// Exists but must be regenerated
    PresentStale(StaleReason),
}

/// Why a present secret is not reusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    MissingData(Vec<String>),
    MissingAnnotation(&'static str),
    InvalidAnnotation { key: &'static str, value: String },
    DurationChanged { recorded: String, configured: String },
    WithinRenewalWindow { not_after: DateTime<Utc> },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData(keys) => write!(f, "missing data keys [{}]", keys.join(", ")),
            Self::MissingAnnotation(key) => write!(f, "missing annotation '{}'", key),
            Self::InvalidAnnotation { key, value } => {
                write!(f, "unparsable annotation '{}': '{}'", key, value)
            }
            Self::DurationChanged { recorded, configured } => {
                write!(f, "duration changed from {} to {}", recorded, configured)
            }
            Self::WithinRenewalWindow { not_after } => {
                write!(f, "expires at {} which is within the renewal window", not_after)
            }
        }
    }
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::PresentReady)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::PresentReady => "ready",
            Self::PresentStale(_) => "stale",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PresentStale(reason) => write!(f, "stale ({})", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Data keys a complete secret of `role` must carry.
pub fn required_keys(role: CertRole) -> &'static [&'static str] {
    match role {
        CertRole::Ca => &[CA_PRIVATE_KEY, CA_CERT_KEY],
        CertRole::Node | CertRole::Client => &[TLS_PRIVATE_KEY, TLS_CERT_KEY, CA_CERT_KEY],
    }
}

/// Evaluate `secret` for `role` at time `now`.
pub fn evaluate(
    secret: Option<&StoredSecret>,
    role: CertRole,
    config: &CertConfig,
    now: DateTime<Utc>,
) -> Readiness {
    let Some(secret) = secret else {
        return Readiness::Absent;
    };
    if let stale @ Readiness::PresentStale(_) = evaluate_material(Some(secret), role) {
        return stale;
    }

    match check_annotations(secret, config, now) {
        Ok(()) => Readiness::PresentReady,
        Err(reason) => Readiness::PresentStale(reason),
    }
}

/// Structural check only: every required data key is present and non-empty.
///
/// Used for user-managed CA secrets, which carry no validity annotations.
pub fn evaluate_material(secret: Option<&StoredSecret>, role: CertRole) -> Readiness {
    let Some(secret) = secret else {
        return Readiness::Absent;
    };

    let missing = secret.missing_keys(required_keys(role));
    if missing.is_empty() {
        Readiness::PresentReady
    } else {
        Readiness::PresentStale(StaleReason::MissingData(
            missing.into_iter().map(str::to_string).collect(),
        ))
    }
}

/// Shorthand for `evaluate(..).is_ready()`.
pub fn is_ready(
    secret: Option<&StoredSecret>,
    role: CertRole,
    config: &CertConfig,
    now: DateTime<Utc>,
) -> bool {
    evaluate(secret, role, config, now).is_ready()
}

fn check_annotations(
    secret: &StoredSecret,
    config: &CertConfig,
    now: DateTime<Utc>,
) -> Result<(), StaleReason> {
    let raw_duration = secret
        .annotations
        .get(annotations::DURATION)
        .ok_or(StaleReason::MissingAnnotation(annotations::DURATION))?;
    let recorded = annotations::parse_declared_duration(&secret.annotations).ok_or_else(|| {
        StaleReason::InvalidAnnotation { key: annotations::DURATION, value: raw_duration.clone() }
    })?;
    if recorded != config.duration {
        return Err(StaleReason::DurationChanged {
            recorded: format_duration(recorded),
            configured: config.duration_string(),
        });
    }

    let raw_not_before =
        secret.annotations.get(NOT_BEFORE).ok_or(StaleReason::MissingAnnotation(NOT_BEFORE))?;
    if annotations::parse_timestamp(&secret.annotations, NOT_BEFORE).is_none() {
        return Err(StaleReason::InvalidAnnotation {
            key: NOT_BEFORE,
            value: raw_not_before.clone(),
        });
    }

    let raw_not_after =
        secret.annotations.get(NOT_AFTER).ok_or(StaleReason::MissingAnnotation(NOT_AFTER))?;
    let not_after = annotations::parse_timestamp(&secret.annotations, NOT_AFTER).ok_or_else(
        || StaleReason::InvalidAnnotation { key: NOT_AFTER, value: raw_not_after.clone() },
    )?;

    let window = chrono::Duration::from_std(config.renewal_window)
        .map_err(|_| StaleReason::WithinRenewalWindow { not_after })?;
    match not_after.checked_sub_signed(window) {
        Some(renew_at) if now < renew_at => Ok(()),
        _ => Err(StaleReason::WithinRenewalWindow { not_after }),
    }
}
