//! Graph data structures and dataset ingestion.
//!
//! [`Graph`] is the immutable unit of input: node count, symmetric
//! neighbor sets, a class label, and one-hot node-feature indices.
//! [`load_dataset`] parses the GNN-benchmark text format into graphs, and
//! [`k_fold_split`] produces seeded train/test index splits.

mod dataset;
mod graph;

pub use dataset::{k_fold_split, load_dataset, load_dataset_path, Dataset, DatasetError};
pub use graph::Graph;
