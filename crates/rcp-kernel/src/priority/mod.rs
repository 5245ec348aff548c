//! Priority Scorer
//!
//! Scores rank nodes and feed the policy evaluator. They never decide legal
//! execution order; topology does.
//!
//! raw = 120 - 2 * position + sum(criticality) - 2 * sum(coupling)
//! score = round(clamp(raw, 1, 100))

use crate::graph::Graph;
use crate::topology::TopologyReport;
use crate::types::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lower bound of a bounded score
pub const MIN_SCORE: u8 = 1;
/// Upper bound of a bounded score
pub const MAX_SCORE: u8 = 100;

const BASE: f64 = 120.0;
const POSITION_DECAY: f64 = 2.0;
const COUPLING_PENALTY: f64 = 2.0;

/// Bounded score plus the unclamped value it came from
///
/// Ordering compares the bounded score first and falls back to the raw value,
/// so nodes that both saturate at 100 still rank by their inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriorityScore {
    /// Score bounded to `1..=100`
    pub score: u8,
    /// Score before clamping and rounding
    pub raw: f64,
}

impl PriorityScore {
    /// Bounded score
    #[inline]
    #[must_use]
    pub fn value(&self) -> u8 {
        self.score
    }
}

impl PartialEq for PriorityScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityScore {}

impl PartialOrd for PriorityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.raw.total_cmp(&other.raw))
    }
}

/// Unclamped score of a node at `position` in an ordering of `total_nodes`
///
/// Positions past the end of the ordering are treated as the last position.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn raw_score(node: &Node, position: usize, total_nodes: usize) -> f64 {
    let position = position.min(total_nodes.saturating_sub(1));
    BASE - POSITION_DECAY * position as f64 + f64::from(node.incoming_criticality())
        - COUPLING_PENALTY * node.incoming_coupling()
}

/// Score a node, bounded to `1..=100`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn score_node(node: &Node, position: usize, total_nodes: usize) -> PriorityScore {
    let raw = raw_score(node, position, total_nodes);
    let score = raw
        .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE))
        .round() as u8;
    PriorityScore { score, raw }
}

/// Score every node by its position in the report's full order
///
/// Residual nodes take positions after the resolved prefix. The map keeps
/// that order.
#[must_use]
pub fn score_graph(graph: &Graph, report: &TopologyReport) -> IndexMap<NodeId, PriorityScore> {
    let total = graph.node_count();
    report
        .order
        .iter()
        .chain(&report.residual)
        .enumerate()
        .filter_map(|(position, id)| {
            graph
                .node(id.as_str())
                .map(|node| (id.clone(), score_node(node, position, total)))
        })
        .collect()
}

/// Node ids ranked by descending score, ties by ascending position
#[must_use]
pub fn ranked(scores: &IndexMap<NodeId, PriorityScore>) -> Vec<NodeId> {
    let mut entries: Vec<(usize, &NodeId, &PriorityScore)> = scores
        .iter()
        .enumerate()
        .map(|(position, (id, score))| (position, id, score))
        .collect();
    entries.sort_by(|a, b| b.2.cmp(a.2).then(a.0.cmp(&b.0)));
    entries.into_iter().map(|(_, id, _)| id.clone()).collect()
}
