//! What a run did, and what `status` found.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ca::CaSource;
use crate::domain::CertRole;
use crate::readiness::Readiness;

/// Per-role result of [`super::Orchestrator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// An existing secret was kept
    Reused,
    /// New material was generated and persisted
    Generated,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Generated => "generated",
        }
    }
}

impl From<CaSource> for StepOutcome {
    fn from(source: CaSource) -> Self {
        match source {
            CaSource::Generated => Self::Generated,
            CaSource::UserSupplied | CaSource::Reused | CaSource::Adopted => Self::Reused,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub role: CertRole,
    pub secret_name: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub namespace: String,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn step(&self, role: CertRole) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.role == role)
    }

    pub fn outcome(&self, role: CertRole) -> Option<StepOutcome> {
        self.step(role).map(|step| step.outcome)
    }

    /// Roles for which new material was written
    pub fn generated(&self) -> Vec<CertRole> {
        self.steps
            .iter()
            .filter(|step| step.outcome == StepOutcome::Generated)
            .map(|step| step.role)
            .collect()
    }

    /// True when nothing had to be generated
    pub fn is_noop(&self) -> bool {
        self.generated().is_empty()
    }
}

/// Read-only view of one role's secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleStatus {
    pub role: CertRole,
    pub secret_name: String,
    pub readiness: Readiness,
    /// Recorded end of validity, when annotated
    pub not_after: Option<DateTime<Utc>>,
}
