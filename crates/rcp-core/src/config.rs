//! Planner configuration

use rcp_kernel::scheduler::UNBOUNDED_WAVE;
use rcp_policy::ConstraintSet;
use serde::{Deserialize, Serialize};

/// Settings for one [`Planner`](crate::Planner)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Cap on nodes per wave; `None` keeps depth buckets whole
    pub max_nodes_per_wave: Option<usize>,
    /// Constraint set the budget is evaluated against
    pub constraints: ConstraintSet,
}

impl PlannerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a wave size cap
    #[inline]
    #[must_use]
    pub fn with_max_nodes_per_wave(mut self, max: usize) -> Self {
        self.max_nodes_per_wave = Some(max);
        self
    }

    /// With unbounded waves
    #[inline]
    #[must_use]
    pub fn with_unbounded_waves(mut self) -> Self {
        self.max_nodes_per_wave = None;
        self
    }

    /// With a constraint set
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Wave limit as passed to the partitioner
    #[inline]
    #[must_use]
    pub fn wave_limit(&self) -> usize {
        self.max_nodes_per_wave.unwrap_or(UNBOUNDED_WAVE)
    }
}
