//! Constraint set configuration
//!
//! Every field has a default, so a TOML file only needs the values it
//! overrides:
//!
//! ```toml
//! retry_ceiling = 3
//!
//! [parallelism]
//! min = 2
//! max = 16
//! ```

use crate::budget::{ReadinessBand, Urgency};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive `[min, max]` band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    /// Lowest allowed value
    pub min: u32,
    /// Highest allowed value
    pub max: u32,
}

impl Band {
    /// Create a band
    #[inline]
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the band
    #[inline]
    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedBand {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// External risk gate settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyGateConfig {
    /// Risk scores below this fail the gate
    pub pass_threshold: f64,
    /// Failing scores above this are reported as high severity
    pub high_severity_above: f64,
}

impl Default for PolicyGateConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 60.0,
            high_severity_above: 80.0,
        }
    }
}

/// Minimum pass rate each gate must reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Duration gate
    pub duration: f64,
    /// Parallelism gate
    pub parallelism: f64,
    /// Retry gate
    pub retry: f64,
    /// External risk gate
    pub policy: f64,
    /// Topology gate
    pub topology: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            duration: 1.0,
            parallelism: 1.0,
            retry: 1.0,
            policy: 1.0,
            topology: 1.0,
        }
    }
}

impl GateThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        for (gate, value) in [
            ("duration", self.duration),
            ("parallelism", self.parallelism),
            ("retry", self.retry),
            ("policy", self.policy),
            ("topology", self.topology),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { gate, value });
            }
        }
        Ok(())
    }
}

/// Additive risk-score bonus per urgency class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyBonus {
    /// Bonus for critical scenarios
    pub critical: f64,
    /// Bonus for urgent scenarios
    pub urgent: f64,
    /// Bonus for routine scenarios
    pub routine: f64,
}

impl Default for UrgencyBonus {
    fn default() -> Self {
        Self {
            critical: 20.0,
            urgent: 12.0,
            routine: 5.0,
        }
    }
}

impl UrgencyBonus {
    /// Bonus for `urgency`
    #[must_use]
    pub fn for_urgency(&self, urgency: Urgency) -> f64 {
        match urgency {
            Urgency::Critical => self.critical,
            Urgency::Urgent => self.urgent,
            Urgency::Routine => self.routine,
        }
    }
}

/// Additive adjustments from incident signals and readiness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalAdjustments {
    /// Risk points removed per open incident signal
    pub per_signal_penalty: f64,
    /// Cap on the total signal penalty
    pub max_signal_penalty: f64,
    /// Adjustment when the surrounding system is ready
    pub ready: f64,
    /// Adjustment when partially ready
    pub partial: f64,
    /// Adjustment when degraded
    pub degraded: f64,
}

impl Default for SignalAdjustments {
    fn default() -> Self {
        Self {
            per_signal_penalty: 0.5,
            max_signal_penalty: 10.0,
            ready: 5.0,
            partial: 0.0,
            degraded: -5.0,
        }
    }
}

impl SignalAdjustments {
    /// Adjustment for a readiness band
    #[must_use]
    pub fn for_readiness(&self, band: ReadinessBand) -> f64 {
        match band {
            ReadinessBand::Ready => self.ready,
            ReadinessBand::Partial => self.partial,
            ReadinessBand::Degraded => self.degraded,
        }
    }

    /// Penalty for `volume` open signals, capped
    #[must_use]
    pub fn signal_penalty(&self, volume: u32) -> f64 {
        (f64::from(volume) * self.per_signal_penalty).min(self.max_signal_penalty)
    }
}

/// Limits and gates a plan is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    /// Minimum composite risk score for a passing verdict
    pub risk_floor: f64,
    /// Ceiling on per-node retries
    pub retry_ceiling: u32,
    /// Allowed `max_duration_minutes` band
    pub duration: Band,
    /// Allowed `parallelism_limit` band
    pub parallelism: Band,
    /// External risk gate settings
    pub policy_gate: PolicyGateConfig,
    /// Minimum pass rate per gate
    pub thresholds: GateThresholds,
    /// Additive bonus per urgency class
    pub urgency_bonus: UrgencyBonus,
    /// Signal and readiness adjustments
    pub signals: SignalAdjustments,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            risk_floor: 40.0,
            retry_ceiling: 5,
            duration: Band::new(15, 480),
            parallelism: Band::new(1, 20),
            policy_gate: PolicyGateConfig::default(),
            thresholds: GateThresholds::default(),
            urgency_bonus: UrgencyBonus::default(),
            signals: SignalAdjustments::default(),
        }
    }
}

impl ConstraintSet {
    /// Default constraint set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a parallelism band
    #[inline]
    #[must_use]
    pub fn with_parallelism(mut self, min: u32, max: u32) -> Self {
        self.parallelism = Band::new(min, max);
        self
    }

    /// With a duration band
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, min: u32, max: u32) -> Self {
        self.duration = Band::new(min, max);
        self
    }

    /// With a retry ceiling
    #[inline]
    #[must_use]
    pub fn with_retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = ceiling;
        self
    }

    /// With a policy gate pass threshold
    #[inline]
    #[must_use]
    pub fn with_policy_threshold(mut self, threshold: f64) -> Self {
        self.policy_gate.pass_threshold = threshold;
        self
    }

    /// Check bands, thresholds and scalar settings for consistency
    ///
    /// # Errors
    /// Returns [`ConfigError`] for inverted bands, thresholds outside `[0, 1]`
    /// or non-finite numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.duration.validate("duration")?;
        self.parallelism.validate("parallelism")?;
        self.thresholds.validate()?;

        for (field, value) in [
            ("risk_floor", self.risk_floor),
            ("policy_gate.pass_threshold", self.policy_gate.pass_threshold),
            ("policy_gate.high_severity_above", self.policy_gate.high_severity_above),
            ("urgency_bonus.critical", self.urgency_bonus.critical),
            ("urgency_bonus.urgent", self.urgency_bonus.urgent),
            ("urgency_bonus.routine", self.urgency_bonus.routine),
            ("signals.per_signal_penalty", self.signals.per_signal_penalty),
            ("signals.max_signal_penalty", self.signals.max_signal_penalty),
            ("signals.ready", self.signals.ready),
            ("signals.partial", self.signals.partial),
            ("signals.degraded", self.signals.degraded),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML constraint set
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed input, or a validation error.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let set: Self = toml::from_str(input)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a TOML constraint set from disk
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ConstraintSet::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading constraint set");
        Self::from_toml_str(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let set = ConstraintSet::from_toml_str(
            r#"
            retry_ceiling = 3

            [parallelism]
            min = 2
            max = 16
            "#,
        )
        .unwrap();

        assert_eq!(set.retry_ceiling, 3);
        assert_eq!(set.parallelism, Band::new(2, 16));
        assert_eq!(set.duration, ConstraintSet::default().duration);
        assert!((set.risk_floor - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let err = ConstraintSet::from_toml_str("[duration]\nmin = 100\nmax = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvertedBand { name: "duration", .. }));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let err = ConstraintSet::from_toml_str("[thresholds]\nretry = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOutOfRange { gate: "retry", .. }));
    }

    #[test]
    fn non_finite_settings_are_rejected() {
        let err = ConstraintSet::from_toml_str("risk_floor = nan\n").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { field: "risk_floor", .. }));

        let err = ConstraintSet::from_toml_str("[signals]\nready = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { field: "signals.ready", .. }));

        let err =
            ConstraintSet::from_toml_str("[policy_gate]\npass_threshold = -inf\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinite { field: "policy_gate.pass_threshold", .. }
        ));
    }

    #[test]
    fn defaults_validate() {
        assert!(ConstraintSet::default().validate().is_ok());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ConstraintSet::from_toml_str("retry_ceiling = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "risk_floor = 55.0").unwrap();

        let set = ConstraintSet::load(file.path()).unwrap();
        assert!((set.risk_floor - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ConstraintSet::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn signal_penalty_is_capped() {
        let adjustments = SignalAdjustments::default();
        assert!((adjustments.signal_penalty(4) - 2.0).abs() < f64::EPSILON);
        assert!((adjustments.signal_penalty(1_000) - 10.0).abs() < f64::EPSILON);
    }
}
