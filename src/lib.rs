//! ginfer: Graph Isomorphism Network (GIN) inference for Rust.
//!
//! This crate runs the forward pass of a trained GIN-style graph neural
//! network on CPU. Weights come from an external training run (a PyTorch
//! state-dict exported as text), graphs from the standard GNN-benchmark
//! text format. Training, gradients, and GPU execution are out of scope.
//!
//! # Pipeline
//!
//! 1. [`compat::WeightTable`] parses the exported weight file.
//! 2. [`data::load_dataset`] parses graphs (node tags, neighbor lists, labels).
//! 3. [`batch::GraphBatch`] lays a batch of graphs out block-diagonally:
//!    one-hot node features, a graph-pooling matrix, and a neighbor
//!    aggregation structure.
//! 4. [`model::GinModel`] runs the layered forward pass: neighbor
//!    aggregation, MLP + batch norm per layer, and a per-layer linear
//!    readout summed into raw class scores.
//!
//! # Example
//!
//! ```ignore
//! use ginfer::compat::WeightTable;
//! use ginfer::data::load_dataset_path;
//! use ginfer::model::{GinConfig, GinModel};
//!
//! let table = WeightTable::from_path("model.txt")?;
//! let model = GinModel::from_table(&table, GinConfig::default())?;
//! let dataset = load_dataset_path("dataset/MUTAG/MUTAG.txt", false)?;
//! let classes = model.predict(&dataset.graphs, 32)?;
//! ```

pub mod batch;
pub mod compat;
pub mod data;
pub mod error;
pub mod linalg;
pub mod model;
pub mod nn;
pub mod predict;
pub mod testing;

pub use error::{Error, Result};
