//! Error types for policy configuration
//!
//! Evaluation itself never fails; only loading or validating a
//! [`ConstraintSet`](crate::ConstraintSet) can.

use std::path::PathBuf;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Constraint file could not be read
    #[error("failed to read constraint file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Constraint file is not valid TOML for a constraint set
    #[error("invalid constraint file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A band has `min > max`
    #[error("band '{name}' is inverted: min {min} > max {max}")]
    InvertedBand {
        /// Band name
        name: &'static str,
        /// Configured minimum
        min: u32,
        /// Configured maximum
        max: u32,
    },

    /// A numeric setting is NaN or infinite
    #[error("setting '{field}' must be a finite number, got {value}")]
    NonFinite {
        /// Dotted setting name
        field: &'static str,
        /// Configured value
        value: f64,
    },

    /// A gate threshold or rate lies outside `[0, 1]`
    #[error("threshold for gate '{gate}' must be within [0, 1], got {value}")]
    ThresholdOutOfRange {
        /// Gate name
        gate: &'static str,
        /// Configured value
        value: f64,
    },
}
