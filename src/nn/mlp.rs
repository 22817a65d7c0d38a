//! Multi-layer perceptron.

use crate::error::{Error, Result};
use crate::linalg::{Activation, Matrix};
use crate::nn::{BatchNorm, Linear};

/// A fixed-depth stack of [`Linear`] layers with [`BatchNorm`] + ReLU
/// between them.
///
/// For a depth-`n` MLP (`n >= 2`): layers `0..n-1` are each followed by
/// batch normalization and ReLU; the final layer's output is returned raw.
/// A depth-1 MLP is exactly one linear layer, no normalization, no
/// activation.
#[derive(Debug, Clone)]
pub struct Mlp {
    linears: Vec<Linear>,
    norms: Vec<BatchNorm>,
}

impl Mlp {
    /// Assemble an MLP from its layers.
    ///
    /// Requires at least one linear layer and exactly one batch norm per
    /// hidden layer (`norms.len() == linears.len() - 1`).
    pub fn new(linears: Vec<Linear>, norms: Vec<BatchNorm>) -> Result<Self> {
        if linears.is_empty() {
            return Err(Error::InvalidConfig(
                "an MLP needs at least one linear layer".into(),
            ));
        }
        if norms.len() != linears.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "an MLP with {} linear layers needs {} batch norms, got {}",
                linears.len(),
                linears.len() - 1,
                norms.len()
            )));
        }
        Ok(Self { linears, norms })
    }

    /// Number of linear layers.
    #[inline]
    pub fn depth(&self) -> usize {
        self.linears.len()
    }

    /// Input channel count.
    #[inline]
    pub fn in_features(&self) -> usize {
        self.linears[0].in_features()
    }

    /// Output channel count.
    #[inline]
    pub fn out_features(&self) -> usize {
        self.linears[self.linears.len() - 1].out_features()
    }

    /// Forward a channel-major input `(in_features × batch)` through the
    /// stack. The input is read-only.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let last = self.linears.len() - 1;
        let mut h = self.linears[0].forward(input)?;
        for i in 0..last {
            h = self.norms[i].forward(&h)?;
            h = h.activation(Activation::Relu);
            h = self.linears[i + 1].forward(&h)?;
        }
        Ok(h)
    }
}
