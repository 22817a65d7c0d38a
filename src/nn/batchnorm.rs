//! Per-channel batch normalization.

use crate::error::{Error, Result};
use crate::linalg::Matrix;

/// Variance stabilizer added before the square root.
pub const BN_EPS: f32 = 1e-5;

#[derive(Debug, Clone)]
struct RunningStats {
    mean: Box<[f32]>,
    var: Box<[f32]>,
}

/// Batch normalization over the batch dimension (columns).
///
/// Two modes, fixed at construction:
///
/// - **Inference mode** ([`BatchNorm::with_running_stats`]): per channel
///   `i`, `y = (x - mean[i]) / sqrt(var[i] + eps) * gamma[i] + beta[i]`,
///   using the running statistics recorded during training.
/// - **On-the-fly mode** ([`BatchNorm::new`]): mean and variance are
///   computed from the batch itself, per channel, with the biased
///   estimator `var = E[x²] - E[x]²` (no Bessel correction). Floating
///   cancellation can push that expression slightly negative, so it is
///   clamped at zero before the square root.
///
/// The two modes are not numerically interchangeable; which one a layer
/// uses is decided by which tensors the weight export carries.
#[derive(Debug, Clone)]
pub struct BatchNorm {
    gamma: Box<[f32]>,
    beta: Box<[f32]>,
    running: Option<RunningStats>,
}

impl BatchNorm {
    /// On-the-fly mode: statistics computed from each input batch.
    pub fn new(gamma: Vec<f32>, beta: Vec<f32>) -> Result<Self> {
        if beta.len() != gamma.len() {
            return Err(Error::ChannelMismatch {
                op: "batch_norm",
                expected: gamma.len(),
                actual: beta.len(),
            });
        }
        Ok(Self {
            gamma: gamma.into_boxed_slice(),
            beta: beta.into_boxed_slice(),
            running: None,
        })
    }

    /// Inference mode: normalize with recorded running statistics.
    pub fn with_running_stats(
        gamma: Vec<f32>,
        beta: Vec<f32>,
        mean: Vec<f32>,
        var: Vec<f32>,
    ) -> Result<Self> {
        let channels = gamma.len();
        for len in [beta.len(), mean.len(), var.len()] {
            if len != channels {
                return Err(Error::ChannelMismatch {
                    op: "batch_norm",
                    expected: channels,
                    actual: len,
                });
            }
        }
        Ok(Self {
            gamma: gamma.into_boxed_slice(),
            beta: beta.into_boxed_slice(),
            running: Some(RunningStats {
                mean: mean.into_boxed_slice(),
                var: var.into_boxed_slice(),
            }),
        })
    }

    /// Channel count.
    #[inline]
    pub fn channels(&self) -> usize {
        self.gamma.len()
    }

    /// Whether this layer normalizes with running statistics.
    #[inline]
    pub fn uses_running_stats(&self) -> bool {
        self.running.is_some()
    }

    /// Normalize a channel-major input `(channels × batch)`.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        if input.num_rows() != self.channels() {
            return Err(Error::ChannelMismatch {
                op: "batch_norm",
                expected: self.channels(),
                actual: input.num_rows(),
            });
        }
        let mut out = Matrix::zeros(input.num_rows(), input.num_cols());
        for i in 0..self.channels() {
            let row = input.row(i);
            let (mean, var) = match &self.running {
                Some(stats) => (stats.mean[i], stats.var[i]),
                None => batch_stats(row),
            };
            let denom = (var + BN_EPS).sqrt();
            let (gamma, beta) = (self.gamma[i], self.beta[i]);
            for (o, &x) in out.row_mut(i).iter_mut().zip(row.iter()) {
                *o = (x - mean) / denom * gamma + beta;
            }
        }
        Ok(out)
    }
}

/// Biased per-channel batch statistics: `(mean, max(E[x²] - E[x]², 0))`.
fn batch_stats(row: &[f32]) -> (f32, f32) {
    if row.is_empty() {
        return (0.0, 0.0);
    }
    let n = row.len() as f32;
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    for &x in row {
        sum += x;
        sum_sq += x * x;
    }
    let mean = sum / n;
    let var = (sum_sq / n - mean * mean).max(0.0);
    (mean, var)
}
