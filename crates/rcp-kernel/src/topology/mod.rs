//! Topology Analyzer
//!
//! Validates and orders a [`Graph`]: roots, Kahn ordering with a residual set,
//! per-node depth, cycle detection and health metrics. Every function here is
//! a pure function of its input; adjacency and depth tables are rebuilt per
//! call and never cached across graphs.

pub mod cycle;

use crate::error::StructuralIssue;
use crate::graph::{AdjacencyIndex, Graph};
use crate::types::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Result of Kahn ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologicalOrder {
    /// Resolved nodes in a legal execution order
    pub order: Vec<NodeId>,
    /// Nodes that could not be ordered, in declaration order
    pub residual: Vec<NodeId>,
    /// One issue per residual node
    pub issues: Vec<StructuralIssue>,
    /// True when the residual contains nodes held back by a cycle
    pub residual_has_cycle: bool,
}

impl TopologicalOrder {
    /// Resolved order followed by the residual set
    #[must_use]
    pub fn full_order(&self) -> Vec<NodeId> {
        self.order.iter().chain(&self.residual).cloned().collect()
    }
}

/// Aggregate graph health figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Nodes in the graph
    pub node_count: usize,
    /// Resolved, deduplicated edges
    pub edge_count: usize,
    /// Mean inbound edges per node
    pub average_fan_in: f64,
    /// Mean outbound edges per node
    pub average_fan_out: f64,
    /// Most inbound edges on any node
    pub max_fan_in: usize,
    /// Most outbound edges on any node
    pub max_fan_out: usize,
    /// Either cycle probe found a cycle
    pub has_cycles: bool,
    /// Deepest resolved node
    pub max_depth: usize,
}

impl HealthMetrics {
    /// Metrics of an empty graph
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            average_fan_in: 0.0,
            average_fan_out: 0.0,
            max_fan_in: 0,
            max_fan_out: 0,
            has_cycles: false,
            max_depth: 0,
        }
    }

    /// Mean of average fan-in and average fan-out
    #[inline]
    #[must_use]
    pub fn coupling_factor(&self) -> f64 {
        (self.average_fan_in + self.average_fan_out) / 2.0
    }
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Both independent cycle verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleFlags {
    /// Kahn residual holds cycle-blocked nodes
    pub kahn_residual: bool,
    /// Depth-first search found a back edge
    pub back_edge: bool,
}

impl CycleFlags {
    /// Whether both probes reached the same verdict
    #[inline]
    #[must_use]
    pub fn agree(&self) -> bool {
        self.kahn_residual == self.back_edge
    }

    /// Whether either probe found a cycle
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.kahn_residual || self.back_edge
    }
}

/// Longest chain through the resolved order, weighted by expected duration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPath {
    /// Chain from first to last node
    pub nodes: Vec<NodeId>,
    /// Sum of expected durations along the chain
    pub total_minutes: u64,
}

/// Full derived view over one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyReport {
    /// Resolved execution order
    pub order: Vec<NodeId>,
    /// Unresolved nodes, appended after the order for best-effort planning
    pub residual: Vec<NodeId>,
    /// Depth per node, in declaration order
    pub depths: IndexMap<NodeId, usize>,
    /// Nodes without declared prerequisites
    pub roots: Vec<NodeId>,
    /// Nodes nothing depends on
    pub exit_nodes: Vec<NodeId>,
    /// Nodes sitting on a cycle
    pub cycle_members: Vec<NodeId>,
    /// Verdicts of both cycle probes
    pub cycle_flags: CycleFlags,
    /// Aggregate health figures
    pub health: HealthMetrics,
    /// Longest duration-weighted chain
    pub critical_path: CriticalPath,
    /// Construction and ordering issues
    pub issues: Vec<StructuralIssue>,
}

impl TopologyReport {
    /// Whether the Kahn residual and the back-edge probe agree
    #[inline]
    #[must_use]
    pub fn cycle_probe_agrees(&self) -> bool {
        self.cycle_flags.agree()
    }

    /// Whether no structural issue was found
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Depth of a node, if it exists
    #[must_use]
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.depths.get(id).copied()
    }
}

/// Nodes with zero inbound edges, in declaration order
///
/// A dangling dependency still counts as an inbound edge: the node has a
/// declared prerequisite, it just cannot be satisfied.
#[must_use]
pub fn find_roots(graph: &Graph) -> Vec<NodeId> {
    graph
        .nodes()
        .iter()
        .filter(|node| node.dependencies.is_empty())
        .map(|node| node.id.clone())
        .collect()
}

/// Nodes no other node depends on, in declaration order
#[must_use]
pub fn find_exit_nodes(graph: &Graph) -> Vec<NodeId> {
    let index = AdjacencyIndex::of(graph);
    exit_indices(&index)
        .into_iter()
        .map(|i| graph.nodes()[i].id.clone())
        .collect()
}

fn exit_indices(index: &AdjacencyIndex) -> Vec<usize> {
    (0..index.len())
        .filter(|&i| index.successors(i).is_empty())
        .collect()
}

/// Kahn's algorithm with declaration-order tie-breaking
#[must_use]
pub fn topological_order(graph: &Graph) -> TopologicalOrder {
    let index = AdjacencyIndex::of(graph);
    let sequence = kahn_sequence(&index);
    order_from_sequence(graph, &index, &sequence)
}

/// Raw Kahn pass over resolved edges
///
/// The ready set is a min-heap on declaration index, so among nodes whose
/// prerequisites are all satisfied the earliest declared goes first.
fn kahn_sequence(index: &AdjacencyIndex) -> Vec<usize> {
    let mut in_degree: Vec<usize> = (0..index.len())
        .map(|i| index.predecessors(i).len())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut sequence = Vec::with_capacity(index.len());

    while let Some(Reverse(node)) = ready.pop() {
        sequence.push(node);
        for &succ in index.successors(node) {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    sequence
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Ordered,
    /// Never dequeued by Kahn: on or behind a cycle
    CycleBlocked,
    /// Dequeued, but a prerequisite (transitively) references an unknown id
    MissingBlocked,
}

fn placements(index: &AdjacencyIndex, sequence: &[usize]) -> Vec<Placement> {
    let mut placement = vec![Placement::CycleBlocked; index.len()];
    // `sequence` is topological, so every predecessor is settled first
    for &node in sequence {
        let blocked = !index.dangling(node).is_empty()
            || index
                .predecessors(node)
                .iter()
                .any(|&p| placement[p] == Placement::MissingBlocked);
        placement[node] = if blocked {
            Placement::MissingBlocked
        } else {
            Placement::Ordered
        };
    }
    placement
}

fn order_from_sequence(graph: &Graph, index: &AdjacencyIndex, sequence: &[usize]) -> TopologicalOrder {
    let nodes = graph.nodes();
    let placement = placements(index, sequence);

    let order: Vec<NodeId> = sequence
        .iter()
        .filter(|&&i| placement[i] == Placement::Ordered)
        .map(|&i| nodes[i].id.clone())
        .collect();

    let on_cycle = cycle::cycle_members(index);
    let mut residual = Vec::new();
    let mut issues = Vec::new();
    let mut residual_has_cycle = false;

    for (i, node) in nodes.iter().enumerate() {
        match placement[i] {
            Placement::Ordered => {}
            Placement::CycleBlocked => {
                residual_has_cycle = true;
                let blocker = if on_cycle.binary_search(&i).is_ok() {
                    None
                } else {
                    index
                        .predecessors(i)
                        .iter()
                        .find(|&&p| placement[p] == Placement::CycleBlocked)
                        .map(|&p| &nodes[p].id)
                };
                issues.push(StructuralIssue::cycle(&node.id, blocker));
                residual.push(node.id.clone());
            }
            Placement::MissingBlocked => {
                let prerequisite = index
                    .dangling(i)
                    .first()
                    .map(|&d| &node.dependencies[d].node_id)
                    .or_else(|| {
                        index
                            .predecessors(i)
                            .iter()
                            .find(|&&p| placement[p] == Placement::MissingBlocked)
                            .map(|&p| &nodes[p].id)
                    });
                if let Some(prerequisite) = prerequisite {
                    issues.push(StructuralIssue::missing_prerequisite(&node.id, prerequisite));
                }
                residual.push(node.id.clone());
            }
        }
    }

    if !residual.is_empty() {
        tracing::debug!(
            plan = %graph.plan_id(),
            resolved = order.len(),
            residual = residual.len(),
            "topological order left unresolved nodes"
        );
    }

    TopologicalOrder {
        order,
        residual,
        issues,
        residual_has_cycle,
    }
}

/// Depth of every node, indexed by declaration order
///
/// depth(n) = 0 without prerequisites, else 1 + max depth of its direct
/// prerequisites. Computed iteratively with an explicit stack; the memo table
/// lives only for this call. Edges closing a cycle are ignored so the
/// computation terminates on cyclic input.
#[must_use]
pub fn node_depths(index: &AdjacencyIndex) -> Vec<usize> {
    let mut memo: Vec<Option<usize>> = vec![None; index.len()];
    let mut on_stack = vec![false; index.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..index.len() {
        if memo[start].is_some() {
            continue;
        }
        on_stack[start] = true;
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let preds = index.predecessors(node);

            if next < preds.len() {
                frame.1 += 1;
                let pred = preds[next];
                if memo[pred].is_none() && !on_stack[pred] {
                    on_stack[pred] = true;
                    stack.push((pred, 0));
                }
                continue;
            }

            let depth = preds
                .iter()
                .filter_map(|&p| memo[p])
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            memo[node] = Some(depth);
            on_stack[node] = false;
            stack.pop();
        }
    }

    memo.into_iter().map(Option::unwrap_or_default).collect()
}

/// Depth of a single node; `None` if the id is not in the graph
#[must_use]
pub fn node_depth(graph: &Graph, id: &str) -> Option<usize> {
    let position = graph.position(id)?;
    let index = AdjacencyIndex::of(graph);
    Some(node_depths(&index)[position])
}

/// Health metrics for a graph
#[must_use]
pub fn health_metrics(graph: &Graph) -> HealthMetrics {
    analyze(graph).health
}

#[allow(clippy::cast_precision_loss)]
fn compute_health(
    index: &AdjacencyIndex,
    depths: &[usize],
    ordered: &[usize],
    flags: CycleFlags,
) -> HealthMetrics {
    let node_count = index.len();
    if node_count == 0 {
        return HealthMetrics::empty();
    }

    let edge_count = index.edge_count();
    let fan_in_total: usize = (0..node_count).map(|i| index.predecessors(i).len()).sum();
    let fan_out_total: usize = (0..node_count).map(|i| index.successors(i).len()).sum();
    debug_assert_eq!(fan_in_total, edge_count);
    debug_assert_eq!(fan_out_total, edge_count);

    HealthMetrics {
        node_count,
        edge_count,
        average_fan_in: fan_in_total as f64 / node_count as f64,
        average_fan_out: fan_out_total as f64 / node_count as f64,
        max_fan_in: (0..node_count)
            .map(|i| index.predecessors(i).len())
            .max()
            .unwrap_or(0),
        max_fan_out: (0..node_count)
            .map(|i| index.successors(i).len())
            .max()
            .unwrap_or(0),
        has_cycles: flags.any(),
        max_depth: ordered.iter().map(|&i| depths[i]).max().unwrap_or(0),
    }
}

fn critical_path(graph: &Graph, index: &AdjacencyIndex, ordered: &[usize]) -> CriticalPath {
    let nodes = graph.nodes();
    let mut total: Vec<Option<u64>> = vec![None; index.len()];
    let mut via: Vec<Option<usize>> = vec![None; index.len()];

    for &node in ordered {
        let mut best: Option<(u64, usize)> = None;
        for &pred in index.predecessors(node) {
            if let Some(t) = total[pred] {
                if best.map_or(true, |(b, _)| t > b) {
                    best = Some((t, pred));
                }
            }
        }
        let own = u64::from(nodes[node].expected_duration_minutes);
        total[node] = Some(own + best.map_or(0, |(t, _)| t));
        via[node] = best.map(|(_, p)| p);
    }

    let mut end: Option<(u64, usize)> = None;
    for &node in ordered {
        if let Some(t) = total[node] {
            if end.map_or(true, |(b, _)| t > b) {
                end = Some((t, node));
            }
        }
    }

    let Some((total_minutes, mut cursor)) = end else {
        return CriticalPath::default();
    };
    let mut chain = vec![cursor];
    while let Some(prev) = via[cursor] {
        chain.push(prev);
        cursor = prev;
    }
    chain.reverse();

    CriticalPath {
        nodes: chain.into_iter().map(|i| nodes[i].id.clone()).collect(),
        total_minutes,
    }
}

/// Run the full analysis and assemble a [`TopologyReport`]
#[must_use]
pub fn analyze(graph: &Graph) -> TopologyReport {
    let index = AdjacencyIndex::of(graph);
    let sequence = kahn_sequence(&index);
    let ordering = order_from_sequence(graph, &index, &sequence);

    let flags = CycleFlags {
        kahn_residual: ordering.residual_has_cycle,
        back_edge: cycle::has_back_edge(&index),
    };
    if !flags.agree() {
        tracing::warn!(
            plan = %graph.plan_id(),
            kahn = flags.kahn_residual,
            dfs = flags.back_edge,
            "cycle probes disagree"
        );
    }
    debug_assert!(flags.agree(), "kahn residual and back-edge probe disagree");

    let nodes = graph.nodes();
    let ordered: Vec<usize> = ordering
        .order
        .iter()
        .filter_map(|id| graph.position(id.as_str()))
        .collect();
    let depths = node_depths(&index);
    let health = compute_health(&index, &depths, &ordered, flags);
    let critical_path = critical_path(graph, &index, &ordered);

    let mut issues = graph.construction_issues().to_vec();
    issues.extend(ordering.issues);

    TopologyReport {
        depths: nodes
            .iter()
            .zip(&depths)
            .map(|(node, &d)| (node.id.clone(), d))
            .collect(),
        roots: find_roots(graph),
        exit_nodes: exit_indices(&index)
            .into_iter()
            .map(|i| nodes[i].id.clone())
            .collect(),
        cycle_members: cycle::cycle_members(&index)
            .into_iter()
            .map(|i| nodes[i].id.clone())
            .collect(),
        order: ordering.order,
        residual: ordering.residual,
        cycle_flags: flags,
        health,
        critical_path,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;
    use crate::graph::build_graph;
    use crate::types::{DependencyDescriptor, Node, PlanId, TenantId};
    use pretty_assertions::assert_eq;

    fn graph(nodes: Vec<Node>) -> Graph {
        build_graph(PlanId::new("p"), TenantId::new("t"), nodes)
    }

    fn dep(id: &str) -> DependencyDescriptor {
        DependencyDescriptor::new(id, 1, 0.0)
    }

    fn ids(list: &[NodeId]) -> Vec<&str> {
        list.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn roots_are_nodes_without_dependencies() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("a")),
            Node::new("c"),
        ]);
        assert_eq!(ids(&find_roots(&g)), vec!["a", "c"]);
        assert_eq!(ids(&find_exit_nodes(&g)), vec!["b", "c"]);
    }

    #[test]
    fn ties_follow_declaration_order() {
        let g = graph(vec![
            Node::new("late").depends_on(dep("root")),
            Node::new("root"),
            Node::new("early").depends_on(dep("root")),
            Node::new("free"),
        ]);
        let order = topological_order(&g);
        assert_eq!(ids(&order.order), vec!["root", "late", "early", "free"]);
        assert!(order.residual.is_empty());
    }

    #[test]
    fn two_cycle_lands_in_residual() {
        let g = graph(vec![
            Node::new("x").depends_on(dep("y")),
            Node::new("y").depends_on(dep("x")),
        ]);
        let order = topological_order(&g);
        assert!(order.order.is_empty());
        assert_eq!(ids(&order.residual), vec!["x", "y"]);
        assert!(order.issues.iter().all(|i| i.kind == IssueKind::Cycle));
        assert!(order.residual_has_cycle);
    }

    #[test]
    fn downstream_of_cycle_names_its_blocker() {
        let g = graph(vec![
            Node::new("x").depends_on(dep("y")),
            Node::new("y").depends_on(dep("x")),
            Node::new("z").depends_on(dep("y")),
        ]);
        let order = topological_order(&g);
        let z_issue = order.issues.iter().find(|i| i.node_id.as_str() == "z").unwrap();
        assert_eq!(z_issue.kind, IssueKind::Cycle);
        assert_eq!(z_issue.related.as_ref().map(NodeId::as_str), Some("y"));
    }

    #[test]
    fn missing_prerequisite_blocks_descendants() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("ghost")),
            Node::new("c").depends_on(dep("b")).depends_on(dep("a")),
        ]);
        let order = topological_order(&g);
        assert_eq!(ids(&order.order), vec!["a"]);
        assert_eq!(ids(&order.residual), vec!["b", "c"]);
        assert!(order
            .issues
            .iter()
            .all(|i| i.kind == IssueKind::MissingPrerequisite));
        assert!(!order.residual_has_cycle);
    }

    #[test]
    fn depth_is_longest_prerequisite_chain() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("a")),
            Node::new("c").depends_on(dep("b")),
            Node::new("d").depends_on(dep("a")).depends_on(dep("c")),
        ]);
        assert_eq!(node_depth(&g, "a"), Some(0));
        assert_eq!(node_depth(&g, "c"), Some(2));
        assert_eq!(node_depth(&g, "d"), Some(3));
        assert_eq!(node_depth(&g, "nope"), None);
    }

    #[test]
    fn depth_terminates_on_cycles() {
        let g = graph(vec![
            Node::new("x").depends_on(dep("y")),
            Node::new("y").depends_on(dep("x")),
        ]);
        assert!(node_depth(&g, "x").is_some());
        assert!(node_depth(&g, "y").is_some());
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut nodes = vec![Node::new("n0")];
        for i in 1..20_000 {
            nodes.push(Node::new(format!("n{i}")).depends_on(dep(&format!("n{}", i - 1))));
        }
        let g = graph(nodes);
        assert_eq!(node_depth(&g, "n19999"), Some(19_999));
    }

    #[test]
    fn health_metrics_for_diamond() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("a")),
            Node::new("c").depends_on(dep("a")),
            Node::new("d").depends_on(dep("b")).depends_on(dep("c")),
        ]);
        let health = health_metrics(&g);
        assert_eq!(health.node_count, 4);
        assert_eq!(health.edge_count, 4);
        assert!((health.average_fan_in - 1.0).abs() < f64::EPSILON);
        assert!((health.average_fan_out - 1.0).abs() < f64::EPSILON);
        assert_eq!(health.max_fan_in, 2);
        assert_eq!(health.max_fan_out, 2);
        assert_eq!(health.max_depth, 2);
        assert!(!health.has_cycles);
    }

    #[test]
    fn empty_graph_yields_zeroed_report() {
        let report = analyze(&graph(Vec::new()));
        assert!(report.order.is_empty());
        assert!(report.residual.is_empty());
        assert_eq!(report.health, HealthMetrics::empty());
        assert_eq!(report.critical_path, CriticalPath::default());
    }

    #[test]
    fn critical_path_follows_longest_duration() {
        let g = graph(vec![
            Node::new("a").with_duration(5),
            Node::new("b").with_duration(30).depends_on(dep("a")),
            Node::new("c").with_duration(10).depends_on(dep("a")),
            Node::new("d").with_duration(5).depends_on(dep("b")).depends_on(dep("c")),
        ]);
        let report = analyze(&g);
        assert_eq!(ids(&report.critical_path.nodes), vec!["a", "b", "d"]);
        assert_eq!(report.critical_path.total_minutes, 40);
    }

    #[test]
    fn report_merges_construction_and_ordering_issues() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("a"),
            Node::new("b").depends_on(dep("ghost")),
        ]);
        let report = analyze(&g);
        let kinds: Vec<IssueKind> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::DuplicateNode,
                IssueKind::DanglingDependency,
                IssueKind::MissingPrerequisite
            ]
        );
        assert!(report.cycle_probe_agrees());
    }
}
