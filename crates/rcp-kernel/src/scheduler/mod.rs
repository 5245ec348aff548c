//! Wave Partitioner
//!
//! Groups the resolved order into parallel-safe waves. Nodes of equal depth
//! never depend on each other, so each depth bucket is a candidate wave;
//! oversized buckets are then sliced into chunks of at most
//! `max_nodes_per_wave`, keeping their relative order.
//!
//! Residual nodes (cycle or missing-prerequisite blocked) are never placed in
//! a wave. They are reported as issues on the topology report instead.

use crate::graph::Graph;
use crate::topology::{analyze, TopologyReport};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pass as `max_nodes_per_wave` to disable sub-chunking
pub const UNBOUNDED_WAVE: usize = usize::MAX;

/// A batch of nodes that may run concurrently once earlier waves complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Position in the wave sequence
    pub index: usize,
    /// Depth shared by every node in the wave
    pub depth: usize,
    /// Members, in resolved order
    pub nodes: Vec<NodeId>,
}

impl Wave {
    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the wave has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is in this wave
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.as_str() == id)
    }
}

/// Partition a graph into waves
///
/// `max_nodes_per_wave` of zero is clamped to one; [`UNBOUNDED_WAVE`] keeps
/// each depth bucket whole.
#[must_use]
pub fn partition_waves(graph: &Graph, max_nodes_per_wave: usize) -> Vec<Wave> {
    partition_report(&analyze(graph), max_nodes_per_wave)
}

/// Partition using an already computed topology report
#[must_use]
pub fn partition_report(report: &TopologyReport, max_nodes_per_wave: usize) -> Vec<Wave> {
    let buckets = bucket_by_depth(&report.order, |id| report.depth_of(id.as_str()));
    slice_buckets(buckets, max_nodes_per_wave)
}

/// Group an ordered node list into depth-indexed buckets
///
/// The result is indexed by depth, ascending. Nodes keep their relative
/// order from `order`. Depths with no nodes produce no bucket.
pub fn bucket_by_depth<F>(order: &[NodeId], depth_of: F) -> Vec<(usize, Vec<NodeId>)>
where
    F: Fn(&NodeId) -> Option<usize>,
{
    let mut buckets: Vec<Vec<NodeId>> = Vec::new();
    for id in order {
        let Some(depth) = depth_of(id) else {
            continue;
        };
        if buckets.len() <= depth {
            buckets.resize_with(depth + 1, Vec::new);
        }
        buckets[depth].push(id.clone());
    }

    buckets
        .into_iter()
        .enumerate()
        .filter(|(_, bucket)| !bucket.is_empty())
        .collect()
}

/// Slice depth buckets into waves no larger than `max_nodes_per_wave`
#[must_use]
pub fn slice_buckets(buckets: Vec<(usize, Vec<NodeId>)>, max_nodes_per_wave: usize) -> Vec<Wave> {
    let limit = max_nodes_per_wave.max(1);
    let mut waves = Vec::with_capacity(buckets.len());

    for (depth, bucket) in buckets {
        for chunk in bucket.chunks(limit) {
            waves.push(Wave {
                index: waves.len(),
                depth,
                nodes: chunk.to_vec(),
            });
        }
    }

    waves
}

/// Map each scheduled node to its wave index
#[must_use]
pub fn wave_index_map(waves: &[Wave]) -> HashMap<NodeId, usize> {
    waves
        .iter()
        .flat_map(|wave| wave.nodes.iter().map(move |id| (id.clone(), wave.index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::types::{DependencyDescriptor, Node, PlanId, TenantId};
    use pretty_assertions::assert_eq;

    fn graph(nodes: Vec<Node>) -> Graph {
        build_graph(PlanId::new("p"), TenantId::new("t"), nodes)
    }

    fn dep(id: &str) -> DependencyDescriptor {
        DependencyDescriptor::new(id, 1, 0.0)
    }

    fn shape(waves: &[Wave]) -> Vec<Vec<&str>> {
        waves
            .iter()
            .map(|w| w.nodes.iter().map(NodeId::as_str).collect())
            .collect()
    }

    #[test]
    fn fan_out_groups_by_depth() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("a")),
            Node::new("c").depends_on(dep("a")),
        ]);
        let waves = partition_waves(&g, 2);
        assert_eq!(shape(&waves), vec![vec!["a"], vec!["b", "c"]]);
        assert_eq!(waves[1].depth, 1);
        assert_eq!(waves[1].index, 1);
    }

    #[test]
    fn oversized_buckets_are_chunked_in_order() {
        let g = graph(vec![
            Node::new("r"),
            Node::new("a").depends_on(dep("r")),
            Node::new("b").depends_on(dep("r")),
            Node::new("c").depends_on(dep("r")),
        ]);
        let waves = partition_waves(&g, 2);
        assert_eq!(shape(&waves), vec![vec!["r"], vec!["a", "b"], vec!["c"]]);
        assert_eq!(waves[2].depth, 1);
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let g = graph(vec![Node::new("a"), Node::new("b")]);
        let waves = partition_waves(&g, 0);
        assert_eq!(shape(&waves), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn unbounded_keeps_buckets_whole() {
        let nodes = (0..50).map(|i| Node::new(format!("n{i}"))).collect();
        let waves = partition_waves(&graph(nodes), UNBOUNDED_WAVE);
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].len(), 50);
    }

    #[test]
    fn two_cycle_produces_no_waves() {
        let g = graph(vec![
            Node::new("x").depends_on(dep("y")),
            Node::new("y").depends_on(dep("x")),
        ]);
        assert!(partition_waves(&g, 4).is_empty());
    }

    #[test]
    fn wave_index_map_covers_every_scheduled_node() {
        let g = graph(vec![
            Node::new("a"),
            Node::new("b").depends_on(dep("a")),
        ]);
        let waves = partition_waves(&g, UNBOUNDED_WAVE);
        let map = wave_index_map(&waves);
        assert_eq!(map["a"], 0);
        assert_eq!(map["b"], 1);
    }
}
