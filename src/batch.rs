//! Batch preprocessing: block-diagonal layout for a set of graphs.
//!
//! A batch packs a variable-size list of graphs into fixed matrices so
//! the whole forward pass runs as uniform matrix algebra. Graph `g`'s
//! nodes occupy the contiguous global index range starting at the sum of
//! the preceding graphs' node counts.

use crate::data::Graph;
use crate::error::{Error, Result};
use crate::linalg::Matrix;
use crate::model::{GinConfig, Pooling};

/// Padded neighbor-index table used for max-pooling aggregation.
///
/// One row per node, `width` slots per row. A row lists the node's
/// neighbors as global (block-offset) indices, then `-1` sentinels. When
/// epsilon is not learned the last slot is reserved and holds the node's
/// own global index, so the self term participates in the max.
#[derive(Debug, Clone)]
pub struct PaddedNeighbors {
    indices: Box<[i64]>,
    width: usize,
    num_nodes: usize,
}

impl PaddedNeighbors {
    /// Slots per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Node count.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// One node's slot row (`-1` = padding sentinel).
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[inline]
    pub fn row(&self, node: usize) -> &[i64] {
        assert!(node < self.num_nodes, "Node index {node} out of bounds");
        &self.indices[node * self.width..(node + 1) * self.width]
    }
}

/// Neighbor aggregation structure, shaped by the neighbor-pooling rule.
#[derive(Debug, Clone)]
pub enum NeighborStructure {
    /// Max pooling: padded per-node neighbor index table.
    Padded(PaddedNeighbors),
    /// Sum/average pooling: block-diagonal adjacency matrix
    /// `(total_nodes × total_nodes)` with self-loops on the diagonal when
    /// epsilon is not learned, plus per-row degree sums for averaging.
    Adjacency { matrix: Matrix, degrees: Box<[f32]> },
}

/// A batch of graphs laid out for one forward call.
///
/// Holds the three derived structures the forward engine consumes: the
/// one-hot node-feature matrix, the graph-pooling matrix, and the
/// neighbor aggregation structure. All are owned by the batch and live
/// exactly as long as it does.
#[derive(Debug, Clone)]
pub struct GraphBatch {
    node_features: Matrix,
    graph_pool: Matrix,
    neighbors: NeighborStructure,
    num_graphs: usize,
}

impl GraphBatch {
    /// Assemble a batch.
    ///
    /// `input_dim` is the one-hot tag cardinality (every tag index in the
    /// batch must be below it). The config decides the pooling shapes:
    /// max neighbor pooling builds the padded index table, sum/average
    /// build the block adjacency, and `learn_eps = false` adds the self
    /// term to whichever structure is built.
    pub fn new(graphs: &[Graph], input_dim: usize, config: &GinConfig) -> Result<Self> {
        if graphs.is_empty() {
            return Err(Error::InvalidConfig("empty graph batch".into()));
        }
        if config.graph_pooling == Pooling::Max {
            return Err(Error::InvalidConfig(
                "max pooling is only supported for neighbor aggregation".into(),
            ));
        }

        let mut offsets = Vec::with_capacity(graphs.len());
        let mut total_nodes = 0usize;
        for g in graphs {
            offsets.push(total_nodes);
            total_nodes += g.num_nodes();
        }

        let node_features = build_node_features(graphs, &offsets, total_nodes, input_dim)?;
        let graph_pool = build_graph_pool(graphs, &offsets, total_nodes, config.graph_pooling);
        let neighbors = match config.neighbor_pooling {
            Pooling::Max => NeighborStructure::Padded(build_padded_neighbors(
                graphs,
                &offsets,
                total_nodes,
                config.learn_eps,
            )),
            Pooling::Sum | Pooling::Average => {
                let matrix = build_adjacency(graphs, &offsets, total_nodes, config.learn_eps);
                let degrees = (0..total_nodes)
                    .map(|i| matrix.row(i).iter().sum())
                    .collect();
                NeighborStructure::Adjacency { matrix, degrees }
            }
        };

        Ok(Self {
            node_features,
            graph_pool,
            neighbors,
            num_graphs: graphs.len(),
        })
    }

    /// Number of graphs in the batch.
    #[inline]
    pub fn num_graphs(&self) -> usize {
        self.num_graphs
    }

    /// Total node count across the batch.
    #[inline]
    pub fn total_nodes(&self) -> usize {
        self.node_features.num_rows()
    }

    /// One-hot node features, node-major `(total_nodes × input_dim)`.
    #[inline]
    pub fn node_features(&self) -> &Matrix {
        &self.node_features
    }

    /// Graph-pooling matrix `(num_graphs × total_nodes)`.
    #[inline]
    pub fn graph_pool(&self) -> &Matrix {
        &self.graph_pool
    }

    /// Neighbor aggregation structure.
    #[inline]
    pub fn neighbors(&self) -> &NeighborStructure {
        &self.neighbors
    }
}

fn build_node_features(
    graphs: &[Graph],
    offsets: &[usize],
    total_nodes: usize,
    input_dim: usize,
) -> Result<Matrix> {
    let mut features = Matrix::zeros(total_nodes, input_dim);
    for (g, &offset) in graphs.iter().zip(offsets) {
        for &(node, tag) in g.node_features() {
            if tag >= input_dim {
                return Err(Error::IndexOutOfBounds {
                    op: "node features",
                    index: tag,
                    len: input_dim,
                });
            }
            features.set(offset + node, tag, 1.0);
        }
    }
    Ok(features)
}

fn build_graph_pool(
    graphs: &[Graph],
    offsets: &[usize],
    total_nodes: usize,
    pooling: Pooling,
) -> Matrix {
    let mut pool = Matrix::zeros(graphs.len(), total_nodes);
    for (gi, (g, &offset)) in graphs.iter().zip(offsets).enumerate() {
        let value = match pooling {
            Pooling::Average if g.num_nodes() > 0 => 1.0 / g.num_nodes() as f32,
            _ => 1.0,
        };
        for node in 0..g.num_nodes() {
            pool.set(gi, offset + node, value);
        }
    }
    pool
}

fn build_padded_neighbors(
    graphs: &[Graph],
    offsets: &[usize],
    total_nodes: usize,
    learn_eps: bool,
) -> PaddedNeighbors {
    let max_degree = graphs.iter().map(Graph::max_degree).max().unwrap_or(0);
    // Without a learned epsilon the self term needs a reserved slot.
    let width = if learn_eps { max_degree } else { max_degree + 1 };

    let mut indices = vec![-1i64; total_nodes * width];
    for (g, &offset) in graphs.iter().zip(offsets) {
        for node in 0..g.num_nodes() {
            let global = offset + node;
            let row = &mut indices[global * width..(global + 1) * width];
            for (slot, &nbr) in row.iter_mut().zip(g.neighbors(node)) {
                *slot = (offset + nbr) as i64;
            }
            if !learn_eps {
                row[width - 1] = global as i64;
            }
        }
    }
    PaddedNeighbors {
        indices: indices.into_boxed_slice(),
        width,
        num_nodes: total_nodes,
    }
}

fn build_adjacency(
    graphs: &[Graph],
    offsets: &[usize],
    total_nodes: usize,
    learn_eps: bool,
) -> Matrix {
    let mut adj = Matrix::zeros(total_nodes, total_nodes);
    for (g, &offset) in graphs.iter().zip(offsets) {
        for (src, dst) in g.edges() {
            adj.set(offset + src, offset + dst, 1.0);
        }
    }
    if !learn_eps {
        for i in 0..total_nodes {
            adj.set(i, i, 1.0);
        }
    }
    adj
}
