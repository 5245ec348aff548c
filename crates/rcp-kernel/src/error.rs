//! Structural issues found while building or analysing a graph
//!
//! None of these abort planning. They are attached to the topology report and
//! planning continues with best-effort partial results.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a structural issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// A node id was declared more than once; later declarations were dropped
    DuplicateNode,
    /// A dependency references a node id that does not exist in the graph
    DanglingDependency,
    /// A node could not be ordered because it sits on or behind a cycle
    Cycle,
    /// A node could not be ordered because a prerequisite is unresolved
    MissingPrerequisite,
}

impl IssueKind {
    /// Stable kebab-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueKind::DuplicateNode => "duplicate-node",
            IssueKind::DanglingDependency => "dangling-dependency",
            IssueKind::Cycle => "cycle",
            IssueKind::MissingPrerequisite => "missing-prerequisite",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural problem attached to one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralIssue {
    /// Issue category
    pub kind: IssueKind,
    /// Node the issue is attached to
    pub node_id: NodeId,
    /// Other node involved, if any (the missing prerequisite, the blocking node)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<NodeId>,
    /// Human-readable explanation
    pub message: String,
}

impl StructuralIssue {
    pub(crate) fn duplicate(node_id: &NodeId, occurrence: usize) -> Self {
        Self {
            kind: IssueKind::DuplicateNode,
            node_id: node_id.clone(),
            related: None,
            message: format!("node '{node_id}' declared again at position {occurrence}; keeping the first declaration"),
        }
    }

    pub(crate) fn dangling(node_id: &NodeId, missing: &NodeId) -> Self {
        Self {
            kind: IssueKind::DanglingDependency,
            node_id: node_id.clone(),
            related: Some(missing.clone()),
            message: format!("node '{node_id}' depends on unknown node '{missing}'"),
        }
    }

    pub(crate) fn cycle(node_id: &NodeId, blocked_by: Option<&NodeId>) -> Self {
        let message = match blocked_by {
            Some(blocker) if blocker != node_id => {
                format!("node '{node_id}' is blocked by cyclic prerequisite '{blocker}'")
            }
            _ => format!("node '{node_id}' participates in a dependency cycle"),
        };
        Self {
            kind: IssueKind::Cycle,
            node_id: node_id.clone(),
            related: blocked_by.cloned(),
            message,
        }
    }

    pub(crate) fn missing_prerequisite(node_id: &NodeId, prerequisite: &NodeId) -> Self {
        Self {
            kind: IssueKind::MissingPrerequisite,
            node_id: node_id.clone(),
            related: Some(prerequisite.clone()),
            message: format!("node '{node_id}' cannot be scheduled: prerequisite '{prerequisite}' is unresolved"),
        }
    }
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
