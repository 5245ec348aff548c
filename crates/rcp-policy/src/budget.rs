//! Budget envelope and external policy signals supplied by the caller

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational limits for executing a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetEnvelope {
    /// Maximum nodes running at once
    pub parallelism_limit: u32,
    /// Maximum retries per node
    pub retry_limit: u32,
    /// Maximum total duration in minutes
    pub max_duration_minutes: u32,
    /// Whether a human must approve before execution
    #[serde(default)]
    pub requires_approval: bool,
}

impl BudgetEnvelope {
    /// Create an envelope without an approval requirement
    #[inline]
    #[must_use]
    pub fn new(parallelism_limit: u32, retry_limit: u32, max_duration_minutes: u32) -> Self {
        Self {
            parallelism_limit,
            retry_limit,
            max_duration_minutes,
            requires_approval: false,
        }
    }

    /// Require manual approval
    #[inline]
    #[must_use]
    pub fn with_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

impl Default for BudgetEnvelope {
    fn default() -> Self {
        Self::new(4, 2, 120)
    }
}

/// SLA urgency classification of a scenario
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// Customer-facing outage
    Critical,
    /// Degraded service under SLA pressure
    Urgent,
    /// Scheduled or low-impact work
    #[default]
    Routine,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Urgency::Critical => "critical",
            Urgency::Urgent => "urgent",
            Urgency::Routine => "routine",
        })
    }
}

/// Readiness band reported by the surrounding system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessBand {
    /// Runbooks, owners and tooling in place
    Ready,
    /// Some prerequisites missing
    #[default]
    Partial,
    /// Tooling or staffing impaired
    Degraded,
}

/// Graph-external signals feeding the policy gate and risk score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySignals {
    /// SLA urgency of the scenario
    #[serde(default)]
    pub urgency: Urgency,
    /// External risk score in `[0, 100]`; `None` skips the policy gate
    #[serde(default)]
    pub risk_score: Option<f64>,
    /// Number of open incident signals
    #[serde(default)]
    pub signal_volume: u32,
    /// Operational readiness band
    #[serde(default)]
    pub readiness: ReadinessBand,
}

impl PolicySignals {
    /// Signals with the given urgency and nothing else
    #[must_use]
    pub fn with_urgency(urgency: Urgency) -> Self {
        Self {
            urgency,
            ..Self::default()
        }
    }

    /// Set the external risk score
    #[must_use]
    pub fn risk_score(mut self, score: f64) -> Self {
        self.risk_score = Some(score);
        self
    }
}
