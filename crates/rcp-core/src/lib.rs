//! RCP Core (rcp-core)
//!
//! Ties the kernel and policy crates into one planning call:
//!
//! 1. Load a [`Scenario`] (JSON or YAML)
//! 2. Build the graph and analyze its topology
//! 3. Partition into waves and score priorities
//! 4. Evaluate the budget against the constraint set
//! 5. Attach plan-fit advisories
//!
//! # Example
//!
//! ```rust,ignore
//! use rcp_core::{Planner, PlannerConfig, Scenario};
//!
//! let scenario = Scenario::load("failover.yaml")?;
//! let report = Planner::new(PlannerConfig::new().with_max_nodes_per_wave(4)).plan(&scenario);
//! println!("{}", rcp_core::render::render_plan(&report));
//! ```

pub mod advisory;
pub mod config;
pub mod error;
pub mod planner;
pub mod render;
pub mod scenario;

pub use advisory::{Advisory, AdvisoryKind};
pub use config::PlannerConfig;
pub use error::LoadError;
pub use planner::{plan, PlanReport, Planner};
pub use scenario::{Scenario, ScenarioFormat};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
