//! The GIN classifier: configuration, schema discovery, and forward pass.

mod gin;
mod schema;

use std::str::FromStr;

use crate::error::Error;

pub use gin::GinModel;
pub use schema::ModelSchema;

/// Pooling rule, used for both neighbor aggregation and graph readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    /// Plain sum over the pooled set.
    #[default]
    Sum,
    /// Sum divided by the pooled set's size.
    Average,
    /// Element-wise maximum (neighbor aggregation only).
    Max,
}

impl FromStr for Pooling {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s {
            "sum" => Ok(Pooling::Sum),
            "average" => Ok(Pooling::Average),
            "max" => Ok(Pooling::Max),
            other => Err(Error::InvalidConfig(format!(
                "unknown pooling type `{other}` (expected sum, average, or max)"
            ))),
        }
    }
}

/// Inference-time configuration. These settings are not recorded in the
/// weight export and must match the values the model was trained with.
#[derive(Debug, Clone)]
pub struct GinConfig {
    /// How node representations pool into a graph representation.
    pub graph_pooling: Pooling,
    /// How neighbor representations aggregate per node.
    pub neighbor_pooling: Pooling,
    /// Whether the model was trained with a learnable epsilon. When false
    /// the self term is folded into the aggregation structure instead of
    /// being added as a scaled residual.
    pub learn_eps: bool,
    /// Training-time dropout rate. Kept so configurations round-trip;
    /// dropout is inactive during inference.
    pub dropout: f32,
}

impl Default for GinConfig {
    fn default() -> Self {
        Self {
            graph_pooling: Pooling::Sum,
            neighbor_pooling: Pooling::Sum,
            learn_eps: false,
            dropout: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooling_from_str() {
        assert_eq!("sum".parse::<Pooling>().unwrap(), Pooling::Sum);
        assert_eq!("average".parse::<Pooling>().unwrap(), Pooling::Average);
        assert_eq!("max".parse::<Pooling>().unwrap(), Pooling::Max);
        assert!("mean".parse::<Pooling>().is_err());
        assert!("Sum".parse::<Pooling>().is_err());
    }

    #[test]
    fn default_config() {
        let config = GinConfig::default();
        assert_eq!(config.graph_pooling, Pooling::Sum);
        assert_eq!(config.neighbor_pooling, Pooling::Sum);
        assert!(!config.learn_eps);
        assert_eq!(config.dropout, 0.0);
    }
}
