//! RCP Policy (rcp-policy)
//!
//! Evaluates a plan's budget envelope and graph health against a
//! [`ConstraintSet`]. Produces violations, per-gate pass rates, a composite
//! risk score in `[0, 100]` and a pass/fail verdict.
//!
//! # Example
//!
//! ```rust,ignore
//! use rcp_policy::{evaluate, BudgetEnvelope, ConstraintSet, PolicySignals};
//!
//! let result = evaluate(
//!     &ConstraintSet::default(),
//!     &BudgetEnvelope::new(8, 2, 90),
//!     &report.health,
//!     &PolicySignals::default(),
//! );
//! assert!(result.pass || !result.violations.is_empty());
//! ```

pub mod budget;
pub mod constraints;
pub mod error;
pub mod evaluator;

pub use budget::{BudgetEnvelope, PolicySignals, ReadinessBand, Urgency};
pub use constraints::{
    Band, ConstraintSet, GateThresholds, PolicyGateConfig, SignalAdjustments, UrgencyBonus,
};
pub use error::ConfigError;
pub use evaluator::{
    evaluate, ConstraintId, Gate, GateOutcome, PolicyEvaluator, PolicyResult, Severity, Violation,
};
