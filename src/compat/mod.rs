//! External format compatibility loaders.
//!
//! The only external training framework supported is PyTorch: a trained
//! GIN state-dict exported as a flat text file of named tensors. The
//! loader converts it to a [`WeightTable`] the model constructor consumes
//! through typed lookups.

mod pytorch;

pub use pytorch::{ParseError, Tensor, WeightTable};
