//! Plan-fit advisories
//!
//! Non-gating findings about how the partitioned plan sits inside the budget
//! envelope. They never change the policy verdict.

use rcp_kernel::graph::Graph;
use rcp_kernel::scheduler::Wave;
use rcp_kernel::topology::TopologyReport;
use rcp_policy::BudgetEnvelope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a plan-fit advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryKind {
    /// A wave holds more nodes than the budget allows in parallel
    WaveExceedsParallelism,
    /// Estimated makespan is over the time budget
    MakespanExceedsBudget,
    /// The envelope asks for a human sign-off
    ManualApprovalRequired,
    /// Some nodes could not be ordered and are left out of the waves
    UnresolvedNodes,
}

impl AdvisoryKind {
    /// Kebab-case tag, as serialized
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AdvisoryKind::WaveExceedsParallelism => "wave-exceeds-parallelism",
            AdvisoryKind::MakespanExceedsBudget => "makespan-exceeds-budget",
            AdvisoryKind::ManualApprovalRequired => "manual-approval-required",
            AdvisoryKind::UnresolvedNodes => "unresolved-nodes",
        }
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-gating finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Advisory category
    pub kind: AdvisoryKind,
    /// Human-readable detail
    pub message: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Estimated wall-clock minutes: each wave takes as long as its slowest node
#[must_use]
pub fn makespan_minutes(graph: &Graph, waves: &[Wave]) -> u64 {
    waves
        .iter()
        .map(|wave| {
            wave.nodes
                .iter()
                .filter_map(|id| graph.node(id.as_str()))
                .map(|node| u64::from(node.expected_duration_minutes))
                .max()
                .unwrap_or(0)
        })
        .sum()
}

/// Check a partitioned plan against its budget envelope
#[must_use]
pub fn assess(
    graph: &Graph,
    topology: &TopologyReport,
    waves: &[Wave],
    budget: &BudgetEnvelope,
) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let limit = budget.parallelism_limit as usize;

    for wave in waves.iter().filter(|w| w.len() > limit) {
        advisories.push(Advisory {
            kind: AdvisoryKind::WaveExceedsParallelism,
            message: format!(
                "wave {} holds {} nodes but the parallelism limit is {}",
                wave.index,
                wave.len(),
                budget.parallelism_limit
            ),
        });
    }

    let makespan = makespan_minutes(graph, waves);
    if makespan > u64::from(budget.max_duration_minutes) {
        advisories.push(Advisory {
            kind: AdvisoryKind::MakespanExceedsBudget,
            message: format!(
                "estimated makespan {makespan}m exceeds the {}m budget",
                budget.max_duration_minutes
            ),
        });
    }

    if budget.requires_approval {
        advisories.push(Advisory {
            kind: AdvisoryKind::ManualApprovalRequired,
            message: "budget requires manual approval before execution".to_string(),
        });
    }

    if !topology.residual.is_empty() {
        let names: Vec<&str> = topology.residual.iter().map(|id| id.as_str()).collect();
        advisories.push(Advisory {
            kind: AdvisoryKind::UnresolvedNodes,
            message: format!(
                "{} node(s) could not be scheduled: {}",
                names.len(),
                names.join(", ")
            ),
        });
    }

    advisories
}
