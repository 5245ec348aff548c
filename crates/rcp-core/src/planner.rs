//! Planning pipeline
//!
//! Scenario → graph → topology → waves → priorities → policy → advisories.
//! Each stage reads the previous stage's output; nothing is cached between
//! calls, so planning the same scenario twice yields equal reports.

use crate::advisory::{assess, makespan_minutes, Advisory};
use crate::config::PlannerConfig;
use crate::scenario::Scenario;
use indexmap::IndexMap;
use rcp_kernel::graph::Graph;
use rcp_kernel::priority::{ranked, score_graph, PriorityScore};
use rcp_kernel::scheduler::{partition_report, Wave};
use rcp_kernel::topology::{analyze, TopologyReport};
use rcp_kernel::types::NodeId;
use rcp_policy::{BudgetEnvelope, PolicyEvaluator, PolicyResult};
use serde::Serialize;

/// Everything derived from one scenario
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Graph built from the scenario
    pub graph: Graph,
    /// Budget the plan was checked against
    pub budget: BudgetEnvelope,
    /// Structural analysis
    pub topology: TopologyReport,
    /// Parallel waves over resolved nodes
    pub waves: Vec<Wave>,
    /// Scores keyed by node, in full topological order
    pub priorities: IndexMap<NodeId, PriorityScore>,
    /// Node ids by descending priority
    pub ranking: Vec<NodeId>,
    /// Estimated wall-clock minutes across all waves
    pub makespan_minutes: u64,
    /// Policy verdict and violations
    pub policy: PolicyResult,
    /// Non-gating plan-fit findings
    pub advisories: Vec<Advisory>,
}

impl PlanReport {
    /// Policy verdict
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.policy.pass
    }

    /// Wave holding `id`, if it was scheduled
    #[must_use]
    pub fn wave_of(&self, id: &str) -> Option<usize> {
        self.waves.iter().find(|w| w.contains(id)).map(|w| w.index)
    }
}

/// Runs the planning pipeline under one configuration
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
    evaluator: PolicyEvaluator,
}

impl Planner {
    /// Create a planner
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        let evaluator = PolicyEvaluator::new(config.constraints);
        Self { config, evaluator }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a scenario
    ///
    /// Never fails: structural problems end up in `topology.issues`, budget
    /// problems in `policy.violations`.
    #[must_use]
    pub fn plan(&self, scenario: &Scenario) -> PlanReport {
        tracing::info!(
            plan_id = %scenario.plan_id,
            tenant = %scenario.tenant,
            nodes = scenario.nodes.len(),
            "planning scenario"
        );

        let graph = scenario.to_graph();
        let topology = analyze(&graph);
        tracing::debug!(
            resolved = topology.order.len(),
            residual = topology.residual.len(),
            max_depth = topology.health.max_depth,
            "topology analyzed"
        );
        if !topology.issues.is_empty() {
            tracing::warn!(issues = topology.issues.len(), "graph has structural issues");
        }

        let waves = partition_report(&topology, self.config.wave_limit());
        tracing::debug!(waves = waves.len(), "waves partitioned");

        let priorities = score_graph(&graph, &topology);
        let ranking = ranked(&priorities);

        let policy = self
            .evaluator
            .evaluate(&scenario.budget, &topology.health, &scenario.signals);
        let advisories = assess(&graph, &topology, &waves, &scenario.budget);
        let makespan_minutes = makespan_minutes(&graph, &waves);

        tracing::info!(
            pass = policy.pass,
            risk_score = policy.risk_score,
            violations = policy.violations.len(),
            advisories = advisories.len(),
            "plan complete"
        );

        PlanReport {
            graph,
            budget: scenario.budget,
            topology,
            waves,
            priorities,
            ranking,
            makespan_minutes,
            policy,
            advisories,
        }
    }
}

/// Plan a scenario with the default configuration
#[must_use]
pub fn plan(scenario: &Scenario) -> PlanReport {
    Planner::default().plan(scenario)
}
