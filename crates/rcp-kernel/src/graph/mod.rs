//! Graph Model
//!
//! An immutable snapshot of a plan: identity, tenant, creation time and the
//! node set. Edges are a pure projection of node dependency lists and are
//! never stored, so they cannot diverge from the nodes.
//!
//! Re-planning produces a new [`Graph`]; nothing here mutates in place.

mod index;

pub use index::AdjacencyIndex;

use crate::error::StructuralIssue;
use crate::types::{Edge, Node, NodeId, PlanId, TenantId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Immutable plan graph
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    plan_id: PlanId,
    tenant: TenantId,
    created_at: DateTime<Utc>,
    nodes: Vec<Node>,
    #[serde(skip)]
    positions: HashMap<NodeId, usize>,
    construction_issues: Vec<StructuralIssue>,
}

/// Build a graph stamped with the current time
///
/// Duplicate node ids are dropped deterministically (first declaration wins)
/// and recorded as construction issues.
#[must_use]
pub fn build_graph(plan_id: PlanId, tenant: TenantId, nodes: Vec<Node>) -> Graph {
    build_graph_at(plan_id, tenant, nodes, Utc::now())
}

/// Build a graph with an explicit creation timestamp
#[must_use]
pub fn build_graph_at(
    plan_id: PlanId,
    tenant: TenantId,
    nodes: Vec<Node>,
    created_at: DateTime<Utc>,
) -> Graph {
    let mut kept = Vec::with_capacity(nodes.len());
    let mut positions = HashMap::with_capacity(nodes.len());
    let mut construction_issues = Vec::new();

    for (occurrence, node) in nodes.into_iter().enumerate() {
        if positions.contains_key(&node.id) {
            tracing::debug!(node = %node.id, occurrence, "dropping duplicate node declaration");
            construction_issues.push(StructuralIssue::duplicate(&node.id, occurrence));
            continue;
        }
        positions.insert(node.id.clone(), kept.len());
        kept.push(node);
    }

    for node in &kept {
        for dep in &node.dependencies {
            if !positions.contains_key(&dep.node_id) {
                construction_issues.push(StructuralIssue::dangling(&node.id, &dep.node_id));
            }
        }
    }

    debug_assert_eq!(positions.len(), kept.len());

    Graph {
        plan_id,
        tenant,
        created_at,
        nodes: kept,
        positions,
        construction_issues,
    }
}

impl Graph {
    /// Plan identifier
    #[inline]
    #[must_use]
    pub fn plan_id(&self) -> &PlanId {
        &self.plan_id
    }

    /// Owning tenant
    #[inline]
    #[must_use]
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Creation timestamp
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Nodes in declaration order
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of (deduplicated) nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.positions.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether the graph declares a node with this id
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Declaration index of a node
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Issues recorded while building (duplicates, dangling references)
    #[inline]
    #[must_use]
    pub fn construction_issues(&self) -> &[StructuralIssue] {
        &self.construction_issues
    }

    /// Derived edges, one per dependency descriptor, `dependency -> node`
    ///
    /// Includes edges whose prerequisite does not exist; see
    /// [`Graph::resolved_edges`] for the subset the analyser works on.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.dependencies.iter().map(move |dep| Edge {
                    from: dep.node_id.clone(),
                    to: node.id.clone(),
                    weight: dep.coupling_strength(),
                    criticality: dep.criticality,
                    optional: dep.optional,
                })
            })
            .collect()
    }

    /// Derived edges whose prerequisite exists in the graph
    #[must_use]
    pub fn resolved_edges(&self) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|edge| self.contains(edge.from.as_str()))
            .collect()
    }
}
