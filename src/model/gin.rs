//! Graph isomorphism network forward pass.

use rayon::prelude::*;

use super::{GinConfig, ModelSchema, Pooling};
use crate::batch::{GraphBatch, NeighborStructure, PaddedNeighbors};
use crate::compat::WeightTable;
use crate::data::Graph;
use crate::error::{Error, Result};
use crate::linalg::{Activation, Matrix};
use crate::nn::{BatchNorm, Linear, Mlp};
use crate::predict::PredictionOutput;

/// A trained GIN classifier, ready for inference.
///
/// Built from a weight export plus a [`GinConfig`]. The forward pass keeps
/// one node representation per layer (the raw one-hot input counts as
/// layer 0), pools each of them into a graph representation, feeds every
/// pooled representation through its own readout head, and sums the head
/// outputs into the final class scores.
///
/// # Example
///
/// ```ignore
/// use ginfer::model::{GinConfig, GinModel};
///
/// let model = GinModel::from_path("model.txt", GinConfig::default())?;
/// let classes = model.predict(&dataset.graphs, 32)?;
/// ```
#[derive(Debug, Clone)]
pub struct GinModel {
    schema: ModelSchema,
    config: GinConfig,
    eps: Vec<f32>,
    mlps: Vec<Mlp>,
    norms: Vec<BatchNorm>,
    readouts: Vec<Linear>,
}

impl GinModel {
    /// Load a model from a weight export file.
    pub fn from_path<P: AsRef<std::path::Path>>(path: P, config: GinConfig) -> Result<Self> {
        Self::from_table(&WeightTable::from_path(path)?, config)
    }

    /// Build a model from a parsed weight table.
    ///
    /// The table's shape is discovered and validated first (see
    /// [`ModelSchema::probe`]). Each batch norm picks its mode from the
    /// table: layers that carry `running_mean`/`running_var` normalize
    /// with those statistics, layers that carry only `weight`/`bias`
    /// compute statistics from each batch.
    pub fn from_table(table: &WeightTable, config: GinConfig) -> Result<Self> {
        let schema = ModelSchema::probe(table)?;

        let eps = table.vector("eps")?.to_vec();

        let mut readouts = Vec::with_capacity(schema.num_layers);
        for l in 0..schema.num_layers {
            readouts.push(build_linear(table, &format!("linears_prediction.{l}"))?);
        }

        let mut mlps = Vec::with_capacity(schema.num_layers - 1);
        let mut norms = Vec::with_capacity(schema.num_layers - 1);
        for l in 0..schema.num_layers - 1 {
            let mut linears = Vec::with_capacity(schema.mlp_layers);
            for k in 0..schema.mlp_layers {
                linears.push(build_linear(table, &format!("mlps.{l}.linears.{k}"))?);
            }
            let mut inner_norms = Vec::with_capacity(schema.mlp_layers - 1);
            for k in 0..schema.mlp_layers - 1 {
                inner_norms.push(build_norm(table, &format!("mlps.{l}.batch_norms.{k}"))?);
            }
            mlps.push(Mlp::new(linears, inner_norms)?);
            norms.push(build_norm(table, &format!("batch_norms.{l}"))?);
        }

        Ok(Self {
            schema,
            config,
            eps,
            mlps,
            norms,
            readouts,
        })
    }

    /// Discovered model dimensions.
    #[inline]
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Inference configuration.
    #[inline]
    pub fn config(&self) -> &GinConfig {
        &self.config
    }

    /// One-hot node feature width the model expects.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.schema.input_dim
    }

    /// Number of classes.
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.schema.output_dim
    }

    /// Run the forward pass over a prepared batch, producing one score
    /// row per graph.
    pub fn forward(&self, batch: &GraphBatch) -> Result<PredictionOutput> {
        if batch.node_features().num_cols() != self.schema.input_dim {
            return Err(Error::ChannelMismatch {
                op: "forward",
                expected: self.schema.input_dim,
                actual: batch.node_features().num_cols(),
            });
        }

        // h is node-major (total_nodes × dim); layer 0 is the raw input.
        let mut h = batch.node_features().clone();
        let mut scores = self.readout(0, &h, batch)?;
        for l in 0..self.schema.num_layers - 1 {
            h = self.aggregate_layer(l, &h, batch)?;
            scores = scores.add(&self.readout(l + 1, &h, batch)?)?;
        }

        let flat = scores.transpose();
        Ok(PredictionOutput::new(
            flat.into_vec(),
            batch.num_graphs(),
            self.schema.output_dim,
        ))
    }

    /// Classify graphs in batches of `batch_size`, returning one class
    /// index per graph in input order.
    ///
    /// Batch composition is observable: on-the-fly batch norms and the
    /// max-pooling padding value both derive statistics from the whole
    /// batch, so the same graph can score differently under a different
    /// `batch_size`.
    pub fn predict(&self, graphs: &[Graph], batch_size: usize) -> Result<Vec<usize>> {
        check_batch_size(batch_size)?;
        let mut classes = Vec::with_capacity(graphs.len());
        for chunk in graphs.chunks(batch_size) {
            let batch = GraphBatch::new(chunk, self.schema.input_dim, &self.config)?;
            classes.extend(self.forward(&batch)?.best_classes());
        }
        Ok(classes)
    }

    /// Like [`GinModel::predict`], with batches evaluated in parallel.
    ///
    /// Chunking is identical to the sequential path, so for a given
    /// `batch_size` the results match [`GinModel::predict`] exactly.
    pub fn par_predict(&self, graphs: &[Graph], batch_size: usize) -> Result<Vec<usize>> {
        check_batch_size(batch_size)?;
        let per_batch: Vec<Result<Vec<usize>>> = graphs
            .par_chunks(batch_size)
            .map(|chunk| {
                let batch = GraphBatch::new(chunk, self.schema.input_dim, &self.config)?;
                Ok(self.forward(&batch)?.best_classes())
            })
            .collect();

        let mut classes = Vec::with_capacity(graphs.len());
        for part in per_batch {
            classes.extend(part?);
        }
        Ok(classes)
    }

    /// Classification accuracy against the graphs' own labels.
    pub fn evaluate(&self, graphs: &[Graph], batch_size: usize) -> Result<f32> {
        if graphs.is_empty() {
            return Err(Error::InvalidConfig(
                "cannot evaluate on an empty graph set".into(),
            ));
        }
        let classes = self.predict(graphs, batch_size)?;
        let correct = classes
            .iter()
            .zip(graphs)
            .filter(|(&c, g)| c == g.label())
            .count();
        Ok(correct as f32 / graphs.len() as f32)
    }

    /// Pool layer representation `h` per graph and feed it through the
    /// layer's readout head. Returns channel-major scores
    /// `(output_dim × num_graphs)`.
    fn readout(&self, layer: usize, h: &Matrix, batch: &GraphBatch) -> Result<Matrix> {
        let pooled = batch.graph_pool().matmul(h)?;
        self.readouts[layer].forward(&pooled.transpose())
    }

    /// One aggregation layer: neighbor pooling, the optional epsilon
    /// residual, then MLP, batch norm, and ReLU. Node-major in and out.
    fn aggregate_layer(&self, layer: usize, h: &Matrix, batch: &GraphBatch) -> Result<Matrix> {
        let mut agg = match batch.neighbors() {
            NeighborStructure::Padded(padded) => max_aggregate(h, padded),
            NeighborStructure::Adjacency { matrix, degrees } => {
                let mut agg = matrix.matmul(h)?;
                if self.config.neighbor_pooling == Pooling::Average {
                    for (n, &d) in degrees.iter().enumerate() {
                        // Isolated nodes keep their zero row.
                        if d > 0.0 {
                            for v in agg.row_mut(n) {
                                *v /= d;
                            }
                        }
                    }
                }
                agg
            }
        };
        if self.config.learn_eps {
            agg = agg.add(&h.scale(1.0 + self.eps[layer]))?;
        }

        let t = self.mlps[layer].forward(&agg.transpose())?;
        let t = self.norms[layer].forward(&t)?;
        Ok(t.activation(Activation::Relu).transpose())
    }
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch size must be positive".into()));
    }
    Ok(())
}

fn build_linear(table: &WeightTable, prefix: &str) -> Result<Linear> {
    let weight = table.matrix(&format!("{prefix}.weight"))?;
    let bias = table.vector(&format!("{prefix}.bias"))?.to_vec();
    Linear::new(weight, bias)
}

fn build_norm(table: &WeightTable, prefix: &str) -> Result<BatchNorm> {
    let gamma = table.vector(&format!("{prefix}.weight"))?.to_vec();
    let beta = table.vector(&format!("{prefix}.bias"))?.to_vec();
    let mean_key = format!("{prefix}.running_mean");
    let var_key = format!("{prefix}.running_var");
    match (table.contains(&mean_key), table.contains(&var_key)) {
        (true, true) => BatchNorm::with_running_stats(
            gamma,
            beta,
            table.vector(&mean_key)?.to_vec(),
            table.vector(&var_key)?.to_vec(),
        ),
        (false, false) => BatchNorm::new(gamma, beta),
        _ => Err(Error::SchemaMismatch(format!(
            "`{prefix}` carries only one of running_mean/running_var"
        ))),
    }
}

/// Element-wise max over each node's padded neighbor row. Padding slots
/// resolve to a dummy row of per-column minima over the whole batch, so
/// padding never wins the max.
fn max_aggregate(h: &Matrix, padded: &PaddedNeighbors) -> Matrix {
    let (nodes, dim) = h.shape();
    let mut dummy = vec![f32::INFINITY; dim];
    for n in 0..nodes {
        for (d, &v) in h.row(n).iter().enumerate() {
            if v < dummy[d] {
                dummy[d] = v;
            }
        }
    }

    let mut out = Matrix::zeros(nodes, dim);
    for n in 0..nodes {
        let row = out.row_mut(n);
        row.copy_from_slice(&dummy);
        for &slot in padded.row(n) {
            if slot < 0 {
                continue;
            }
            for (o, &v) in row.iter_mut().zip(h.row(slot as usize)) {
                if v > *o {
                    *o = v;
                }
            }
        }
    }
    out
}
