//! Per-role certificate lifetime configuration.

use std::time::Duration;

use super::duration::{format_duration, parse_duration};
use crate::errors::{Error, Result};

/// Validity duration and renewal window for one certificate role.
///
/// The renewal window is the buffer before `not_after` in which an existing
/// certificate is already considered due for reissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertConfig {
    pub duration: Duration,
    pub renewal_window: Duration,
}

impl CertConfig {
    /// Build a config from already-parsed durations, rejecting zero values.
    pub fn new(duration: Duration, renewal_window: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(Error::config("certificate duration must be positive"));
        }
        if renewal_window.is_zero() {
            return Err(Error::config("certificate renewal window must be positive"));
        }
        let config = Self { duration, renewal_window };
        config.validate()?;
        Ok(config)
    }

    /// Both values positive and the renewal window shorter than the duration.
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() || self.renewal_window.is_zero() {
            return Err(Error::config("certificate duration and renewal window must be positive"));
        }
        if self.renewal_window >= self.duration {
            return Err(Error::config(format!(
                "renewal window {} must be shorter than the duration {}",
                format_duration(self.renewal_window),
                format_duration(self.duration)
            )));
        }
        Ok(())
    }

    /// Parse a config from duration strings such as `"8760h"` and `"168h"`.
    pub fn parse(duration: &str, renewal_window: &str) -> Result<Self> {
        let parsed_duration = parse_duration(duration)
            .map_err(|e| Error::config(format!("failed to parse duration: {}", e)))?;
        let parsed_window = parse_duration(renewal_window)
            .map_err(|e| Error::config(format!("failed to parse renewal window: {}", e)))?;
        Self::new(parsed_duration, parsed_window)
    }

    /// Duration in the form recorded in secret annotations
    pub fn duration_string(&self) -> String {
        format_duration(self.duration)
    }
}
