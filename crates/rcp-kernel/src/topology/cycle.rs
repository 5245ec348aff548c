//! Cycle probes that are independent of Kahn ordering
//!
//! The back-edge probe and the Kahn residual must always agree on whether a
//! graph is cyclic; the topology report carries both flags so tests can
//! assert it.

use crate::graph::AdjacencyIndex;
use petgraph::algo::tarjan_scc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Finished,
}

/// First back edge `(from, to)` found by an iterative depth-first search
///
/// Roots of the search are taken in declaration order and successors in
/// adjacency order, so the edge reported is deterministic.
#[must_use]
pub fn find_back_edge(index: &AdjacencyIndex) -> Option<(usize, usize)> {
    let mut marks = vec![Mark::Unvisited; index.len()];
    // (node, position of the next successor to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..index.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::OnStack;
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let successors = index.successors(node);

            if next == successors.len() {
                marks[node] = Mark::Finished;
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let succ = successors[next];
            match marks[succ] {
                Mark::OnStack => return Some((node, succ)),
                Mark::Finished => {}
                Mark::Unvisited => {
                    marks[succ] = Mark::OnStack;
                    stack.push((succ, 0));
                }
            }
        }
    }

    None
}

/// Whether the back-edge probe finds any cycle
#[inline]
#[must_use]
pub fn has_back_edge(index: &AdjacencyIndex) -> bool {
    find_back_edge(index).is_some()
}

/// Declaration indices of nodes that lie on a cycle, ascending
///
/// A node is on a cycle when its strongly connected component has more than
/// one member or it depends on itself.
#[must_use]
pub fn cycle_members(index: &AdjacencyIndex) -> Vec<usize> {
    let mut members: Vec<usize> = tarjan_scc(index.as_graphmap())
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|&n| index.has_self_loop(n))
        })
        .flatten()
        .collect();
    members.sort_unstable();
    members
}
