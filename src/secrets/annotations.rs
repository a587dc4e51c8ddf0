//! Annotation schema recorded on every generated secret.
//!
//! ```text
//! not-before: 2024-01-01T00:00:00Z   (RFC3339, whole seconds)
//! not-after:  2025-01-01T00:00:00Z
//! duration:   8760h0m0s              (configured validity at issuance)
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{format_duration, parse_duration};

/// Start of certificate validity
pub const NOT_BEFORE: &str = "not-before";

/// End of certificate validity
pub const NOT_AFTER: &str = "not-after";

/// Validity duration configured when the certificate was issued
pub const DURATION: &str = "duration";

/// Format a timestamp the way it is annotated
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build the annotation map for a freshly issued certificate.
pub fn certificate_annotations(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    duration: Duration,
) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    annotations.insert(NOT_BEFORE.to_string(), format_timestamp(not_before));
    annotations.insert(NOT_AFTER.to_string(), format_timestamp(not_after));
    annotations.insert(DURATION.to_string(), format_duration(duration));
    annotations
}

/// Parse an annotated timestamp; `None` when missing or malformed.
pub fn parse_timestamp(annotations: &BTreeMap<String, String>, key: &str) -> Option<DateTime<Utc>> {
    let raw = annotations.get(key)?;
    DateTime::parse_from_rfc3339(raw.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Parse the annotated duration; `None` when missing or malformed.
pub fn parse_declared_duration(annotations: &BTreeMap<String, String>) -> Option<Duration> {
    parse_duration(annotations.get(DURATION)?).ok()
}
