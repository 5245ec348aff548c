//! Adjacency lookups over resolved edges

use super::Graph;
use petgraph::graphmap::DiGraphMap;

/// Per-call adjacency index over resolved edges
///
/// Nodes are addressed by declaration index. Successor and predecessor lists
/// keep declaration order so every traversal built on them is deterministic.
/// Built fresh for each analysis and never cached on the graph.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// Declaration indices of dependencies that reference unknown ids
    dangling: Vec<Vec<usize>>,
    inner: DiGraphMap<usize, f64>,
}

impl AdjacencyIndex {
    /// Project the resolved edges of `graph` into index form
    #[must_use]
    pub fn of(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut successors = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut dangling = vec![Vec::new(); n];
        let mut inner = DiGraphMap::with_capacity(n, n);

        for i in 0..n {
            inner.add_node(i);
        }

        for (to, node) in graph.nodes().iter().enumerate() {
            for (dep_index, dep) in node.dependencies.iter().enumerate() {
                let Some(from) = graph.position(dep.node_id.as_str()) else {
                    dangling[to].push(dep_index);
                    continue;
                };
                if predecessors[to].contains(&from) {
                    continue;
                }
                predecessors[to].push(from);
                successors[from].push(to);
                inner.add_edge(from, to, dep.coupling_strength());
            }
        }

        Self {
            successors,
            predecessors,
            dangling,
            inner,
        }
    }

    /// Number of indexed nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// Whether no nodes are indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Direct dependents of `node`
    #[inline]
    #[must_use]
    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    /// Direct prerequisites of `node`
    #[inline]
    #[must_use]
    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.predecessors[node]
    }

    /// Indices (into the node's dependency list) of unresolved references
    #[inline]
    #[must_use]
    pub fn dangling(&self, node: usize) -> &[usize] {
        &self.dangling[node]
    }

    /// Number of resolved, deduplicated edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether `node` depends on itself
    #[inline]
    #[must_use]
    pub fn has_self_loop(&self, node: usize) -> bool {
        self.inner.contains_edge(node, node)
    }

    /// Underlying petgraph view, for algorithms that operate on it directly
    #[inline]
    #[must_use]
    pub fn as_graphmap(&self) -> &DiGraphMap<usize, f64> {
        &self.inner
    }
}
