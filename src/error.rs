//! Crate-wide error type.
//!
//! Every failure here signals structurally invalid input — mismatched
//! shapes, a weight table missing expected tensors, an impossible
//! configuration. None of them are transient: retrying cannot help, and
//! callers must not continue with the partial result. Operations return
//! these as values instead of aborting the process so the caller decides
//! whether to drop the batch or halt.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors raised by the inference pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two operands with incompatible dimensions reached an algebraic
    /// operation or a preprocessing step.
    #[error("{op}: shape mismatch {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// An index-based accessor received an out-of-range index.
    #[error("{op}: index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        op: &'static str,
        index: usize,
        len: usize,
    },

    /// A per-channel layer (bias, batch norm) received input whose channel
    /// count disagrees with its parameters.
    #[error("{op}: expected {expected} channels, got {actual}")]
    ChannelMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A tensor the model needs is absent from the weight table.
    #[error("missing tensor `{0}` in weight table")]
    MissingTensor(String),

    /// The weight table is internally inconsistent: one key family implies
    /// a layer count or dimension another key family contradicts.
    #[error("malformed weight table: {0}")]
    SchemaMismatch(String),

    /// A configuration value that can never work (unknown pooling name,
    /// fold index past the fold count, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The weight file could not be parsed.
    #[error("weight table parse error: {0}")]
    WeightParse(#[from] crate::compat::ParseError),

    /// The graph dataset file could not be parsed.
    #[error("dataset parse error: {0}")]
    DatasetParse(#[from] crate::data::DatasetError),
}
