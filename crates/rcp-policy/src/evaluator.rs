//! Constraint/Policy Evaluator
//!
//! One evaluation per call, no state carried between calls. Every rule is
//! checked independently and all violations are collected. The verdict is
//! always explained: a failing result carries at least one violation.

use crate::budget::{BudgetEnvelope, PolicySignals};
use crate::constraints::{Band, ConstraintSet};
use rcp_kernel::topology::HealthMetrics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Violation severity, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Advisory only
    Low,
    /// Needs attention before execution
    Medium,
    /// Blocks execution
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        })
    }
}

/// Identifier of the rule a violation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintId {
    /// Duration above the band
    DurationOver,
    /// Duration below the band
    DurationUnder,
    /// Parallelism above the band
    ParallelismOver,
    /// Parallelism below the band
    ParallelismUnder,
    /// Retry limit above the ceiling
    RetryPressure,
    /// External risk score below the pass threshold
    PolicyGate,
    /// Dependency graph is cyclic
    GraphCycle,
    /// Composite risk score below the floor
    RiskFloor,
}

impl ConstraintId {
    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConstraintId::DurationOver => "duration-over",
            ConstraintId::DurationUnder => "duration-under",
            ConstraintId::ParallelismOver => "parallelism-over",
            ConstraintId::ParallelismUnder => "parallelism-under",
            ConstraintId::RetryPressure => "retry-pressure",
            ConstraintId::PolicyGate => "policy-gate",
            ConstraintId::GraphCycle => "graph-cycle",
            ConstraintId::RiskFloor => "risk-floor",
        }
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that was broken
    pub constraint: ConstraintId,
    /// Human-readable detail
    pub description: String,
    /// How serious the breach is
    pub severity: Severity,
}

impl Violation {
    fn new(constraint: ConstraintId, severity: Severity, description: String) -> Self {
        Self {
            constraint,
            description,
            severity,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.constraint, self.severity, self.description)
    }
}

/// Named pass/fail check contributing to the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gate {
    /// Duration band
    Duration,
    /// Parallelism band
    Parallelism,
    /// Retry ceiling
    Retry,
    /// External risk score
    Policy,
    /// Acyclic dependency graph
    Topology,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gate::Duration => "duration",
            Gate::Parallelism => "parallelism",
            Gate::Retry => "retry",
            Gate::Policy => "policy",
            Gate::Topology => "topology",
        })
    }
}

/// Pass rate of one gate against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    /// Gate evaluated
    pub gate: Gate,
    /// Pass rate in `[0, 1]`
    pub pass_rate: f64,
    /// Minimum pass rate required
    pub threshold: f64,
    /// Whether `pass_rate >= threshold`
    pub met: bool,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    /// Every broken rule, in evaluation order
    pub violations: Vec<Violation>,
    /// Composite score in `[0, 100]`
    pub risk_score: f64,
    /// Overall verdict
    pub pass: bool,
    /// Per-gate outcomes
    pub gates: Vec<GateOutcome>,
}

impl PolicyResult {
    /// Gates whose pass rate fell short of the threshold
    #[must_use]
    pub fn unmet_gates(&self) -> Vec<Gate> {
        self.gates.iter().filter(|g| !g.met).map(|g| g.gate).collect()
    }

    /// Most severe violation, if any
    #[must_use]
    pub fn highest_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }

    /// Whether any violation came from `constraint`
    #[must_use]
    pub fn violates(&self, constraint: ConstraintId) -> bool {
        self.violations.iter().any(|v| v.constraint == constraint)
    }
}

/// Evaluator bound to one constraint set
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    constraints: ConstraintSet,
}

impl PolicyEvaluator {
    /// Create an evaluator for `constraints`
    #[inline]
    #[must_use]
    pub fn new(constraints: ConstraintSet) -> Self {
        Self { constraints }
    }

    /// Constraint set in use
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Evaluate a budget and graph health against the constraint set
    #[must_use]
    pub fn evaluate(
        &self,
        budget: &BudgetEnvelope,
        health: &HealthMetrics,
        signals: &PolicySignals,
    ) -> PolicyResult {
        evaluate(&self.constraints, budget, health, signals)
    }
}

/// Evaluate a budget and graph health against `constraints`
#[must_use]
pub fn evaluate(
    constraints: &ConstraintSet,
    budget: &BudgetEnvelope,
    health: &HealthMetrics,
    signals: &PolicySignals,
) -> PolicyResult {
    let mut violations = Vec::new();

    let duration = check_duration(constraints.duration, budget.max_duration_minutes, &mut violations);
    let parallelism = check_parallelism(constraints.parallelism, budget.parallelism_limit, &mut violations);
    let retry = check_retry(constraints.retry_ceiling, budget.retry_limit, &mut violations);
    let policy = check_policy_gate(constraints, signals.risk_score, &mut violations);
    let topology = check_topology(health, &mut violations);

    let thresholds = &constraints.thresholds;
    let gates = vec![
        outcome(Gate::Duration, duration, thresholds.duration),
        outcome(Gate::Parallelism, parallelism, thresholds.parallelism),
        outcome(Gate::Retry, retry, thresholds.retry),
        outcome(Gate::Policy, policy, thresholds.policy),
        outcome(Gate::Topology, topology, thresholds.topology),
    ];

    let risk_score = composite_risk_score(constraints, &gates, health, signals);
    // An unordered comparison (NaN floor) counts as below the floor
    let below_floor = risk_score
        .partial_cmp(&constraints.risk_floor)
        .map_or(true, Ordering::is_lt);
    if below_floor {
        violations.push(Violation::new(
            ConstraintId::RiskFloor,
            Severity::Medium,
            format!(
                "composite risk score {risk_score:.1} is below the floor of {:.1}",
                constraints.risk_floor
            ),
        ));
    }

    let pass = !below_floor && gates.iter().all(|g| g.met);
    debug_assert!(pass || !violations.is_empty(), "failing verdict without explanation");

    tracing::debug!(
        risk_score,
        pass,
        violations = violations.len(),
        "policy evaluation finished"
    );

    PolicyResult {
        violations,
        risk_score,
        pass,
        gates,
    }
}

fn outcome(gate: Gate, pass_rate: f64, threshold: f64) -> GateOutcome {
    GateOutcome {
        gate,
        pass_rate,
        threshold,
        met: pass_rate >= threshold,
    }
}

/// Fraction of `limit` that `actual` stays within; 1 when `actual <= limit`
fn ratio_within(limit: u32, actual: u32) -> f64 {
    if actual <= limit {
        1.0
    } else {
        f64::from(limit) / f64::from(actual)
    }
}

/// Fraction of `floor` that `actual` reaches; 1 when `actual >= floor`
fn ratio_reaching(floor: u32, actual: u32) -> f64 {
    if actual >= floor {
        1.0
    } else {
        f64::from(actual) / f64::from(floor)
    }
}

fn check_duration(band: Band, minutes: u32, violations: &mut Vec<Violation>) -> f64 {
    if minutes > band.max {
        violations.push(Violation::new(
            ConstraintId::DurationOver,
            Severity::High,
            format!("max duration {minutes}m exceeds the allowed {}m", band.max),
        ));
        ratio_within(band.max, minutes)
    } else if minutes < band.min {
        violations.push(Violation::new(
            ConstraintId::DurationUnder,
            Severity::Medium,
            format!("max duration {minutes}m is under the required {}m", band.min),
        ));
        ratio_reaching(band.min, minutes)
    } else {
        1.0
    }
}

fn check_parallelism(band: Band, limit: u32, violations: &mut Vec<Violation>) -> f64 {
    if limit > band.max {
        violations.push(Violation::new(
            ConstraintId::ParallelismOver,
            Severity::High,
            format!("parallelism {limit} exceeds the allowed {}", band.max),
        ));
        ratio_within(band.max, limit)
    } else if limit < band.min {
        violations.push(Violation::new(
            ConstraintId::ParallelismUnder,
            Severity::Low,
            format!("parallelism {limit} is under the required {}", band.min),
        ));
        ratio_reaching(band.min, limit)
    } else {
        1.0
    }
}

fn check_retry(ceiling: u32, retries: u32, violations: &mut Vec<Violation>) -> f64 {
    if retries > ceiling {
        violations.push(Violation::new(
            ConstraintId::RetryPressure,
            Severity::Medium,
            format!("retry limit {retries} exceeds the ceiling of {ceiling}"),
        ));
    }
    ratio_within(ceiling, retries)
}

fn check_policy_gate(
    constraints: &ConstraintSet,
    risk_score: Option<f64>,
    violations: &mut Vec<Violation>,
) -> f64 {
    let Some(score) = risk_score else {
        return 1.0;
    };
    // NaN or infinite inputs count as the lowest possible score
    let score = if score.is_finite() { score } else { 0.0 };
    let gate = &constraints.policy_gate;
    if score >= gate.pass_threshold {
        return 1.0;
    }

    let severity = if score > gate.high_severity_above {
        Severity::High
    } else {
        Severity::Medium
    };
    violations.push(Violation::new(
        ConstraintId::PolicyGate,
        severity,
        format!(
            "external risk score {score:.1} is below the pass threshold of {:.1}",
            gate.pass_threshold
        ),
    ));

    if gate.pass_threshold <= 0.0 {
        0.0
    } else {
        (score / gate.pass_threshold).clamp(0.0, 1.0)
    }
}

fn check_topology(health: &HealthMetrics, violations: &mut Vec<Violation>) -> f64 {
    if health.has_cycles {
        violations.push(Violation::new(
            ConstraintId::GraphCycle,
            Severity::High,
            "dependency graph contains a cycle".to_string(),
        ));
        0.0
    } else {
        1.0
    }
}

/// Average gate pass rate scaled to 100, plus additive adjustments, clamped
#[allow(clippy::cast_precision_loss)]
fn composite_risk_score(
    constraints: &ConstraintSet,
    gates: &[GateOutcome],
    health: &HealthMetrics,
    signals: &PolicySignals,
) -> f64 {
    let average = if gates.is_empty() {
        0.0
    } else {
        gates.iter().map(|g| g.pass_rate).sum::<f64>() / gates.len() as f64
    };

    let score = average * 100.0
        + constraints.urgency_bonus.for_urgency(signals.urgency)
        + health.coupling_factor()
        + constraints.signals.for_readiness(signals.readiness)
        - constraints.signals.signal_penalty(signals.signal_volume);

    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{ReadinessBand, Urgency};
    use pretty_assertions::assert_eq;

    fn healthy() -> HealthMetrics {
        HealthMetrics {
            node_count: 3,
            edge_count: 2,
            average_fan_in: 2.0 / 3.0,
            average_fan_out: 2.0 / 3.0,
            max_fan_in: 1,
            max_fan_out: 2,
            has_cycles: false,
            max_depth: 1,
        }
    }

    #[test]
    fn within_limits_passes_without_violations() {
        let result = evaluate(
            &ConstraintSet::default(),
            &BudgetEnvelope::new(8, 2, 60),
            &healthy(),
            &PolicySignals::default(),
        );
        assert!(result.pass);
        assert!(result.violations.is_empty());
        assert!(result.unmet_gates().is_empty());
    }

    #[test]
    fn parallelism_over_is_a_single_high_violation() {
        let constraints = ConstraintSet::default().with_parallelism(1, 20);
        let result = evaluate(
            &constraints,
            &BudgetEnvelope::new(25, 2, 60),
            &healthy(),
            &PolicySignals::with_urgency(Urgency::Critical),
        );

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].constraint, ConstraintId::ParallelismOver);
        assert_eq!(result.violations[0].severity, Severity::High);
        assert!(!result.pass);
        assert_eq!(result.unmet_gates(), vec![Gate::Parallelism]);
    }

    #[test]
    fn under_limits_use_lower_severities() {
        let constraints = ConstraintSet::default()
            .with_parallelism(4, 20)
            .with_duration(30, 240);
        let result = evaluate(
            &constraints,
            &BudgetEnvelope::new(2, 1, 10),
            &healthy(),
            &PolicySignals::default(),
        );

        let found: Vec<(ConstraintId, Severity)> = result
            .violations
            .iter()
            .map(|v| (v.constraint, v.severity))
            .collect();
        assert_eq!(
            found,
            vec![
                (ConstraintId::DurationUnder, Severity::Medium),
                (ConstraintId::ParallelismUnder, Severity::Low),
            ]
        );
    }

    #[test]
    fn all_rules_are_checked_without_short_circuit() {
        let constraints = ConstraintSet::default().with_retry_ceiling(1);
        let mut health = healthy();
        health.has_cycles = true;
        let result = evaluate(
            &constraints,
            &BudgetEnvelope::new(50, 9, 1_000),
            &health,
            &PolicySignals::default().risk_score(20.0),
        );

        let found: Vec<(ConstraintId, Severity)> = result
            .violations
            .iter()
            .map(|v| (v.constraint, v.severity))
            .collect();
        // average pass rate ~0.26 also drops the composite score under the floor
        assert_eq!(
            found,
            vec![
                (ConstraintId::DurationOver, Severity::High),
                (ConstraintId::ParallelismOver, Severity::High),
                (ConstraintId::RetryPressure, Severity::Medium),
                (ConstraintId::PolicyGate, Severity::Medium),
                (ConstraintId::GraphCycle, Severity::High),
                (ConstraintId::RiskFloor, Severity::Medium),
            ]
        );
        assert_eq!(result.highest_severity(), Some(Severity::High));
        assert!(!result.pass);
    }

    #[test]
    fn policy_gate_severity_depends_on_input_score() {
        let constraints = ConstraintSet::default().with_policy_threshold(90.0);
        let budget = BudgetEnvelope::new(4, 1, 60);

        let high = evaluate(&constraints, &budget, &healthy(), &PolicySignals::default().risk_score(85.0));
        let medium = evaluate(&constraints, &budget, &healthy(), &PolicySignals::default().risk_score(50.0));

        assert_eq!(high.violations[0].severity, Severity::High);
        assert_eq!(medium.violations[0].severity, Severity::Medium);
    }

    #[test]
    fn composite_score_adds_urgency_and_health() {
        // retry gate at 0.5, others 1.0 => average 0.9 => 90
        let constraints = ConstraintSet::default().with_retry_ceiling(2);
        let budget = BudgetEnvelope::new(4, 4, 60);
        let health = HealthMetrics::empty();

        let routine = evaluate(&constraints, &budget, &health, &PolicySignals::default());
        assert!((routine.risk_score - 95.0).abs() < 1e-9);

        let critical = evaluate(
            &constraints,
            &budget,
            &health,
            &PolicySignals::with_urgency(Urgency::Critical),
        );
        assert!((critical.risk_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn signals_and_readiness_adjust_score() {
        let constraints = ConstraintSet::default().with_retry_ceiling(2);
        let budget = BudgetEnvelope::new(4, 4, 60);
        let signals = PolicySignals {
            urgency: Urgency::Routine,
            risk_score: None,
            signal_volume: 6,
            readiness: ReadinessBand::Degraded,
        };
        let result = evaluate(&constraints, &budget, &HealthMetrics::empty(), &signals);
        // 90 + 5 - 5 - 3
        assert!((result.risk_score - 87.0).abs() < 1e-9);
    }

    #[test]
    fn low_score_fails_with_explanation() {
        let mut constraints = ConstraintSet::default();
        constraints.risk_floor = 99.5;
        constraints.urgency_bonus.routine = 0.0;
        constraints.signals.partial = 0.0;
        let result = evaluate(
            &constraints,
            &BudgetEnvelope::new(4, 1, 60),
            &HealthMetrics::empty(),
            &PolicySignals {
                signal_volume: 4,
                ..PolicySignals::default()
            },
        );

        assert!(!result.pass);
        assert!(result.unmet_gates().is_empty());
        assert!(result.violates(ConstraintId::RiskFloor));
    }

    #[test]
    fn evaluator_struct_matches_free_function() {
        let constraints = ConstraintSet::default();
        let evaluator = PolicyEvaluator::new(constraints);
        let budget = BudgetEnvelope::default();
        let signals = PolicySignals::default();

        assert_eq!(
            evaluator.evaluate(&budget, &healthy(), &signals),
            evaluate(&constraints, &budget, &healthy(), &signals)
        );
    }

    #[test]
    fn non_finite_external_score_fails_the_gate() {
        let budget = BudgetEnvelope::new(4, 1, 60);
        for input in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = evaluate(
                &ConstraintSet::default(),
                &budget,
                &healthy(),
                &PolicySignals::default().risk_score(input),
            );

            assert!(result.risk_score.is_finite());
            assert!((0.0..=100.0).contains(&result.risk_score));
            assert!(!result.pass);
            assert!(result.violates(ConstraintId::PolicyGate));
            assert_eq!(result.unmet_gates(), vec![Gate::Policy]);
        }
    }

    #[test]
    fn unordered_floor_still_explains_failure() {
        let mut constraints = ConstraintSet::default();
        constraints.risk_floor = f64::NAN;
        let result = evaluate(
            &constraints,
            &BudgetEnvelope::new(4, 1, 60),
            &healthy(),
            &PolicySignals::default(),
        );

        assert!(!result.pass);
        assert!(result.violates(ConstraintId::RiskFloor));
    }

    #[test]
    fn result_serializes_with_kebab_case_tags() {
        let result = evaluate(
            &ConstraintSet::default(),
            &BudgetEnvelope::new(30, 1, 60),
            &healthy(),
            &PolicySignals::default(),
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["violations"][0]["constraint"], "parallelism-over");
        assert_eq!(json["violations"][0]["severity"], "high");
        assert_eq!(json["gates"][1]["gate"], "parallelism");
        assert_eq!(json["pass"], false);

        let back: PolicyResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
