//! Fully-connected layer.

use crate::error::{Error, Result};
use crate::linalg::Matrix;

/// A linear layer: `output = W × input + b`.
///
/// The weight is `(out_features × in_features)`, row-major by output
/// channel — the layout PyTorch exports. The bias is broadcast over the
/// batch dimension: every input column receives the identical bias vector.
/// This is the only broadcast in the whole pipeline.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Matrix,
    bias: Box<[f32]>,
}

impl Linear {
    /// Create a layer from a weight matrix and bias vector.
    ///
    /// The bias length must equal the weight's row count (one bias per
    /// output channel).
    pub fn new(weight: Matrix, bias: Vec<f32>) -> Result<Self> {
        if bias.len() != weight.num_rows() {
            return Err(Error::ChannelMismatch {
                op: "linear",
                expected: weight.num_rows(),
                actual: bias.len(),
            });
        }
        Ok(Self {
            weight,
            bias: bias.into_boxed_slice(),
        })
    }

    /// Input channel count.
    #[inline]
    pub fn in_features(&self) -> usize {
        self.weight.num_cols()
    }

    /// Output channel count.
    #[inline]
    pub fn out_features(&self) -> usize {
        self.weight.num_rows()
    }

    /// Compute `W × input + b` for a channel-major input
    /// `(in_features × batch)`, yielding `(out_features × batch)`.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let mut out = self.weight.matmul(input)?;
        for (i, &b) in self.bias.iter().enumerate() {
            for v in out.row_mut(i) {
                *v += b;
            }
        }
        Ok(out)
    }
}
