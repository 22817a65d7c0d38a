//! Network building blocks: linear layers, batch normalization, MLPs.
//!
//! All layers operate on channel-major matrices (rows = channels,
//! columns = batch items) and are immutable after construction: `forward`
//! never mutates the layer or its input.

mod batchnorm;
mod linear;
mod mlp;

pub use batchnorm::{BatchNorm, BN_EPS};
pub use linear::Linear;
pub use mlp::Mlp;
