//! Error types for loading planner inputs
//!
//! Planning never fails. Only reading scenario or constraint files can.

use rcp_policy::ConfigError;
use std::path::PathBuf;

/// Scenario and configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Extension is neither JSON nor YAML
    #[error("unsupported scenario format for {path}; expected .json, .yaml or .yml")]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
    },

    /// Malformed JSON scenario
    #[error("invalid JSON scenario: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML scenario
    #[error("invalid YAML scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Constraint set failed to load
    #[error("constraint set error: {0}")]
    Config(#[from] ConfigError),
}
