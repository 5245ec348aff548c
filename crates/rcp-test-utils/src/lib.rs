//! Testing utilities for the RCP workspace
//!
//! Shared fixtures: node and dependency shorthands, graphs and scenarios
//! pinned to a fixed timestamp so reports compare equal across runs.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use rcp_core::Scenario;
use rcp_kernel::graph::{build_graph_at, Graph};
use rcp_kernel::types::{DependencyDescriptor, Node, PlanId, TenantId};
use rcp_policy::BudgetEnvelope;

pub const PLAN_ID: &str = "test-plan";
pub const TENANT: &str = "test-tenant";

/// Creation timestamp used by every fixture
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[must_use]
pub fn node(id: &str) -> Node {
    Node::new(id)
}

#[must_use]
pub fn dep(id: &str, criticality: u8, coupling: f64) -> DependencyDescriptor {
    DependencyDescriptor::new(id, criticality, coupling)
}

/// Graph with the fixture plan id, tenant and timestamp
#[must_use]
pub fn fixed_graph(nodes: Vec<Node>) -> Graph {
    build_graph_at(
        PlanId::new(PLAN_ID),
        TenantId::new(TENANT),
        nodes,
        fixed_time(),
    )
}

/// Budget that passes the default constraint set
#[must_use]
pub fn roomy_budget() -> BudgetEnvelope {
    BudgetEnvelope::new(8, 2, 240)
}

/// Scenario with the fixture identity and a roomy budget
#[must_use]
pub fn scenario(nodes: Vec<Node>) -> Scenario {
    Scenario::new(PLAN_ID, TENANT)
        .created_at(fixed_time())
        .with_budget(roomy_budget())
        .with_nodes(nodes)
}

/// `a -> b -> c -> ...` chain of `len` nodes, each `minutes` long
#[must_use]
pub fn chain(len: usize, minutes: u32) -> Vec<Node> {
    (0..len)
        .map(|i| {
            let node = Node::new(format!("step-{i}")).with_duration(minutes);
            if i == 0 {
                node
            } else {
                node.depends_on(dep(&format!("step-{}", i - 1), 3, 0.3))
            }
        })
        .collect()
}

/// Layered graph: `layers` rows of `width` nodes, each depending on every
/// node of the row above
#[must_use]
pub fn layered(layers: usize, width: usize) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(layers * width);
    for layer in 0..layers {
        for col in 0..width {
            let mut node = Node::new(format!("l{layer}-{col}")).with_duration(5);
            if layer > 0 {
                for above in 0..width {
                    node = node.depends_on(dep(&format!("l{}-{above}", layer - 1), 2, 0.1));
                }
            }
            nodes.push(node);
        }
    }
    nodes
}
