//! A single undirected graph with tagged nodes.

use std::collections::BTreeSet;

/// An undirected graph with a class label and one-hot node features.
///
/// Neighbor sets are kept symmetric by construction ([`Graph::add_edge`]
/// inserts both directions) and stored as ordered sets so that every
/// iteration over neighbors — and therefore every reduction built on top
/// of them — runs in a fixed, reproducible order.
///
/// Node features are `(node, tag)` pairs where `tag` indexes into the
/// dataset-wide one-hot tag vocabulary; they are assigned once by the
/// dataset loader after tag densification.
#[derive(Debug, Clone)]
pub struct Graph {
    label: usize,
    neighbors: Vec<BTreeSet<usize>>,
    node_features: Vec<(usize, usize)>,
}

impl Graph {
    /// Create a graph with `num_nodes` isolated nodes.
    pub fn new(label: usize, num_nodes: usize) -> Self {
        Self {
            label,
            neighbors: vec![BTreeSet::new(); num_nodes],
            node_features: Vec::new(),
        }
    }

    /// Insert the undirected edge `{u, v}`.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is out of range.
    pub fn add_edge(&mut self, u: usize, v: usize) {
        let n = self.neighbors.len();
        assert!(
            u < n && v < n,
            "Edge ({u}, {v}) out of bounds for {n} nodes"
        );
        self.neighbors[u].insert(v);
        self.neighbors[v].insert(u);
    }

    /// Assign one-hot node features, one `(node, tag)` pair per node.
    ///
    /// # Panics
    ///
    /// Panics if the pair count differs from the node count.
    pub fn set_node_features(&mut self, features: Vec<(usize, usize)>) {
        assert_eq!(
            features.len(),
            self.neighbors.len(),
            "Expected one feature pair per node ({}), got {}",
            self.neighbors.len(),
            features.len()
        );
        self.node_features = features;
    }

    /// Class label.
    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    /// Node count.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.neighbors.len()
    }

    /// Degree of one node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[inline]
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors[node].len()
    }

    /// Maximum node degree in this graph (0 for an edgeless graph).
    pub fn max_degree(&self) -> usize {
        self.neighbors.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Neighbor set of one node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[inline]
    pub fn neighbors(&self, node: usize) -> &BTreeSet<usize> {
        &self.neighbors[node]
    }

    /// All directed edges `(src, dst)` in ascending `(src, dst)` order.
    /// Each undirected edge appears twice, once per direction.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(src, nbrs)| nbrs.iter().map(move |&dst| (src, dst)))
    }

    /// One-hot node features as `(node, tag)` pairs.
    #[inline]
    pub fn node_features(&self) -> &[(usize, usize)] {
        &self.node_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_symmetric_and_ordered() {
        let mut g = Graph::new(0, 3);
        g.add_edge(1, 0);
        g.add_edge(1, 2);

        assert!(g.neighbors(0).contains(&1));
        assert!(g.neighbors(1).contains(&0));
        assert_eq!(g.degree(1), 2);
        assert_eq!(g.max_degree(), 2);

        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut g = Graph::new(0, 2);
        g.add_edge(0, 1);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        assert_eq!(g.edges().count(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn add_edge_bounds() {
        let mut g = Graph::new(0, 2);
        g.add_edge(0, 2);
    }

    #[test]
    #[should_panic(expected = "one feature pair per node")]
    fn features_must_cover_all_nodes() {
        let mut g = Graph::new(0, 3);
        g.set_node_features(vec![(0, 0)]);
    }
}
