//! Output formatting for CLI commands.
//!
//! Results go to stdout either as a plain table or as JSON; logs go through
//! `tracing` on stderr.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::orchestrator::{RoleStatus, RunReport};
use crate::secrets::annotations::format_timestamp;

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    println!();
    let mut header = String::new();
    for (name, width) in columns {
        header.push_str(&format!("{:<width$} ", name, width = width));
    }
    println!("{}", header.trim_end());
    println!("{}", "-".repeat(columns.iter().map(|(_, w)| w + 1).sum::<usize>()));
}

pub fn print_run_report(report: &RunReport) {
    println!("Namespace: {}", report.namespace);
    print_table_header(&[("Role", 8), ("Secret", 40), ("Outcome", 10)]);
    for step in &report.steps {
        println!(
            "{:<8} {:<40} {:<10}",
            step.role.as_str(),
            truncate(&step.secret_name, 40),
            step.outcome.as_str()
        );
    }
}

/// JSON shape of a [`RoleStatus`]
#[derive(Debug, Serialize)]
pub struct StatusRow {
    pub role: String,
    pub secret: String,
    pub state: String,
    pub detail: String,
    pub not_after: Option<String>,
}

impl From<&RoleStatus> for StatusRow {
    fn from(status: &RoleStatus) -> Self {
        Self {
            role: status.role.as_str().to_string(),
            secret: status.secret_name.clone(),
            state: status.readiness.as_str().to_string(),
            detail: status.readiness.to_string(),
            not_after: status.not_after.map(format_timestamp),
        }
    }
}

pub fn print_status_table(statuses: &[RoleStatus]) {
    print_table_header(&[("Role", 8), ("Secret", 32), ("State", 8), ("Not After", 22), ("Detail", 40)]);
    for status in statuses {
        let row = StatusRow::from(status);
        println!(
            "{:<8} {:<32} {:<8} {:<22} {}",
            row.role,
            truncate(&row.secret, 32),
            row.state,
            row.not_after.as_deref().unwrap_or("-"),
            row.detail
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CertRole;
    use crate::readiness::{Readiness, StaleReason};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("crdb-client-secret", 10), "crdb-cl...");
    }

    #[test]
    fn test_status_row() {
        let status = RoleStatus {
            role: CertRole::Node,
            secret_name: "crdb-node-secret".to_string(),
            readiness: Readiness::PresentStale(StaleReason::MissingAnnotation("duration")),
            not_after: None,
        };
        let row = StatusRow::from(&status);

        assert_eq!(row.role, "node");
        assert_eq!(row.state, "stale");
        assert_eq!(row.detail, "stale (missing annotation 'duration')");
        assert!(row.not_after.is_none());
    }
}
