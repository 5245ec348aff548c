//! Planner input
//!
//! A scenario bundles the node list with the budget envelope and external
//! signals it should be planned against. Files are JSON or YAML, picked by
//! extension:
//!
//! ```yaml
//! plan_id: db-failover
//! tenant: payments
//! budget:
//!   parallelism_limit: 4
//!   retry_limit: 2
//!   max_duration_minutes: 90
//! nodes:
//!   - id: snapshot
//!     expected_duration_minutes: 10
//!   - id: promote
//!     dependencies:
//!       - node_id: snapshot
//!         criticality: 5
//!         coupling: 0.4
//! ```

use crate::error::LoadError;
use chrono::{DateTime, Utc};
use rcp_kernel::graph::{build_graph, build_graph_at, Graph};
use rcp_kernel::types::{Node, PlanId, TenantId};
use rcp_policy::{BudgetEnvelope, PolicySignals};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scenario file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl ScenarioFormat {
    /// Format implied by a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A plan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Plan identifier
    pub plan_id: PlanId,
    /// Owning tenant
    pub tenant: TenantId,
    /// Fixed creation time; the current time is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Budget envelope the plan must fit
    #[serde(default)]
    pub budget: BudgetEnvelope,
    /// Signals fed to the policy gate
    #[serde(default)]
    pub signals: PolicySignals,
    /// Steps in declaration order
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Scenario {
    /// Empty scenario with default budget and signals
    #[must_use]
    pub fn new(plan_id: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            plan_id: PlanId::new(plan_id),
            tenant: TenantId::new(tenant),
            created_at: None,
            budget: BudgetEnvelope::default(),
            signals: PolicySignals::default(),
            nodes: Vec::new(),
        }
    }

    /// Replace the node list
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Replace the budget envelope
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetEnvelope) -> Self {
        self.budget = budget;
        self
    }

    /// Replace the policy signals
    #[must_use]
    pub fn with_signals(mut self, signals: PolicySignals) -> Self {
        self.signals = signals;
        self
    }

    /// Pin the graph creation time
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Build the graph snapshot for this scenario
    #[must_use]
    pub fn to_graph(&self) -> Graph {
        let plan_id = self.plan_id.clone();
        let tenant = self.tenant.clone();
        let nodes = self.nodes.clone();
        match self.created_at {
            Some(at) => build_graph_at(plan_id, tenant, nodes, at),
            None => build_graph(plan_id, tenant, nodes),
        }
    }

    /// Parse a JSON scenario
    ///
    /// # Errors
    /// Returns [`LoadError::Json`] for malformed input.
    pub fn from_json_str(input: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a YAML scenario
    ///
    /// # Errors
    /// Returns [`LoadError::Yaml`] for malformed input.
    pub fn from_yaml_str(input: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Load a scenario file, format chosen by extension
    ///
    /// # Errors
    /// Returns [`LoadError::UnsupportedFormat`] for unknown extensions,
    /// [`LoadError::Io`] if the file cannot be read, or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let format = ScenarioFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let input = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let scenario = match format {
            ScenarioFormat::Json => Self::from_json_str(&input)?,
            ScenarioFormat::Yaml => Self::from_yaml_str(&input)?,
        };
        tracing::debug!(
            path = %path.display(),
            plan_id = %scenario.plan_id,
            nodes = scenario.nodes.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }
}
