//! RCP Kernel (rcp-kernel)
//!
//! Graph construction and scheduling for recovery command plans:
//! 1. **Graph Model**: nodes with declared prerequisites, derived edges
//! 2. **Topology**: Kahn ordering, residual set, depth, cycle probes, health
//! 3. **Scheduler**: depth-bucketed, size-bounded waves
//! 4. **Priority**: position/criticality/coupling scores
//!
//! Every stage is a pure function over an immutable [`graph::Graph`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rcp_kernel::prelude::*;
//!
//! let graph = build_graph(PlanId::new("p-1"), TenantId::new("ops"), nodes);
//! let report = analyze(&graph);
//! let waves = partition_report(&report, 4);
//! let scores = score_graph(&graph, &report);
//! ```

// Core modules
pub mod error;
pub mod graph;
pub mod priority;
pub mod scheduler;
pub mod topology;
pub mod types;

// Re-exports
pub use error::*;
pub use types::*;

/// Re-export the planning surface for convenience
pub mod prelude {
    pub use crate::error::{IssueKind, StructuralIssue};
    pub use crate::graph::{build_graph, build_graph_at, AdjacencyIndex, Graph};
    pub use crate::priority::{ranked, score_graph, score_node, PriorityScore};
    pub use crate::scheduler::{
        bucket_by_depth, partition_report, partition_waves, slice_buckets, wave_index_map, Wave,
        UNBOUNDED_WAVE,
    };
    pub use crate::topology::{
        analyze, find_exit_nodes, find_roots, health_metrics, node_depth, node_depths,
        topological_order, CriticalPath, CycleFlags, HealthMetrics, TopologicalOrder,
        TopologyReport,
    };
    pub use crate::types::{
        Criticality, DependencyDescriptor, Edge, Node, NodeId, PlanId, TenantId,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
