//! Model shape discovery from a weight export.
//!
//! The export carries no explicit header, so every dimension is recovered
//! from the tensors themselves:
//!
//! - `eps` has one entry per aggregation layer, so the representation
//!   count (input plus one per layer) is `len(eps) + 1`.
//! - `linears_prediction.0.weight` maps the input representation to class
//!   scores, giving the input and output dimensions; head 1 gives the
//!   hidden dimension.
//! - MLP depth is found by probing `mlps.0.linears.<k>.bias` keys until
//!   one is absent.

use crate::compat::WeightTable;
use crate::error::{Error, Result};

/// Discovered model dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    /// Number of node representations: the raw input plus one per
    /// aggregation layer. There are `num_layers - 1` aggregation layers
    /// and `num_layers` readout heads.
    pub num_layers: usize,
    /// Linear layers per MLP.
    pub mlp_layers: usize,
    /// One-hot node feature width.
    pub input_dim: usize,
    /// Node representation width after every aggregation layer.
    pub hidden_dim: usize,
    /// Number of classes.
    pub output_dim: usize,
}

impl ModelSchema {
    /// Probe a weight table and validate that every tensor a model of the
    /// discovered shape needs is present with consistent dimensions.
    pub fn probe(table: &WeightTable) -> Result<Self> {
        let eps = table.vector("eps")?;
        if eps.is_empty() {
            return Err(Error::SchemaMismatch(
                "`eps` is empty, model needs at least one aggregation layer".into(),
            ));
        }
        let num_layers = eps.len() + 1;

        let (output_dim, input_dim) = matrix_shape(table, "linears_prediction.0.weight")?;
        let (_, hidden_dim) = matrix_shape(table, "linears_prediction.1.weight")?;

        let mut mlp_layers = 0;
        while table.contains(&format!("mlps.0.linears.{mlp_layers}.bias")) {
            mlp_layers += 1;
        }
        if mlp_layers == 0 {
            return Err(Error::SchemaMismatch(
                "no `mlps.0.linears.*` tensors found".into(),
            ));
        }

        let schema = Self {
            num_layers,
            mlp_layers,
            input_dim,
            hidden_dim,
            output_dim,
        };
        schema.check_readouts(table)?;
        schema.check_layers(table)?;
        Ok(schema)
    }

    fn check_readouts(&self, table: &WeightTable) -> Result<()> {
        for l in 0..self.num_layers {
            let in_dim = if l == 0 { self.input_dim } else { self.hidden_dim };
            expect_matrix(
                table,
                &format!("linears_prediction.{l}.weight"),
                (self.output_dim, in_dim),
            )?;
            expect_vector(
                table,
                &format!("linears_prediction.{l}.bias"),
                self.output_dim,
            )?;
        }
        // One head per representation and no more; a surplus head means
        // the eps count and the readout stack disagree.
        let extra = format!("linears_prediction.{}.weight", self.num_layers);
        if table.contains(&extra) {
            return Err(Error::SchemaMismatch(format!(
                "found `{extra}` but `eps` only accounts for {} heads",
                self.num_layers
            )));
        }
        Ok(())
    }

    fn check_layers(&self, table: &WeightTable) -> Result<()> {
        for l in 0..self.num_layers - 1 {
            let layer_in = if l == 0 { self.input_dim } else { self.hidden_dim };
            for k in 0..self.mlp_layers {
                let in_dim = if k == 0 { layer_in } else { self.hidden_dim };
                expect_matrix(
                    table,
                    &format!("mlps.{l}.linears.{k}.weight"),
                    (self.hidden_dim, in_dim),
                )?;
                expect_vector(table, &format!("mlps.{l}.linears.{k}.bias"), self.hidden_dim)?;
            }
            for k in 0..self.mlp_layers - 1 {
                expect_vector(
                    table,
                    &format!("mlps.{l}.batch_norms.{k}.weight"),
                    self.hidden_dim,
                )?;
                expect_vector(
                    table,
                    &format!("mlps.{l}.batch_norms.{k}.bias"),
                    self.hidden_dim,
                )?;
            }
            expect_vector(table, &format!("batch_norms.{l}.weight"), self.hidden_dim)?;
            expect_vector(table, &format!("batch_norms.{l}.bias"), self.hidden_dim)?;
        }
        Ok(())
    }
}

fn matrix_shape(table: &WeightTable, name: &str) -> Result<(usize, usize)> {
    let tensor = table
        .get(name)
        .ok_or_else(|| Error::MissingTensor(name.to_string()))?;
    Ok(tensor.shape())
}

fn expect_matrix(table: &WeightTable, name: &str, shape: (usize, usize)) -> Result<()> {
    let actual = matrix_shape(table, name)?;
    if actual != shape {
        return Err(Error::SchemaMismatch(format!(
            "`{name}` has shape {actual:?}, expected {shape:?}"
        )));
    }
    Ok(())
}

fn expect_vector(table: &WeightTable, name: &str, len: usize) -> Result<()> {
    let values = table.vector(name)?;
    if values.len() != len {
        return Err(Error::SchemaMismatch(format!(
            "`{name}` has {} entries, expected {len}",
            values.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::Tensor;

    // 2 representations (1 aggregation layer), depth-1 MLPs, all dims 2.
    fn tiny_table() -> WeightTable {
        let mut t = WeightTable::new();
        let m = |v: Vec<f32>| Tensor::new(v, 2, 2);
        t.insert("eps", Tensor::vector(vec![0.0])).unwrap();
        t.insert("linears_prediction.0.weight", m(vec![1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        t.insert("linears_prediction.0.bias", Tensor::vector(vec![0.0, 0.0]))
            .unwrap();
        t.insert("linears_prediction.1.weight", m(vec![1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        t.insert("linears_prediction.1.bias", Tensor::vector(vec![0.0, 0.0]))
            .unwrap();
        t.insert("mlps.0.linears.0.weight", m(vec![1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        t.insert("mlps.0.linears.0.bias", Tensor::vector(vec![0.0, 0.0]))
            .unwrap();
        t.insert("batch_norms.0.weight", Tensor::vector(vec![1.0, 1.0]))
            .unwrap();
        t.insert("batch_norms.0.bias", Tensor::vector(vec![0.0, 0.0]))
            .unwrap();
        t
    }

    #[test]
    fn probes_dimensions() {
        let schema = ModelSchema::probe(&tiny_table()).unwrap();
        assert_eq!(
            schema,
            ModelSchema {
                num_layers: 2,
                mlp_layers: 1,
                input_dim: 2,
                hidden_dim: 2,
                output_dim: 2,
            }
        );
    }

    #[test]
    fn rejects_missing_eps() {
        let mut t = tiny_table();
        t = {
            let mut fresh = WeightTable::new();
            // Rebuild without `eps`.
            for name in [
                "linears_prediction.0.weight",
                "linears_prediction.0.bias",
                "linears_prediction.1.weight",
                "linears_prediction.1.bias",
                "mlps.0.linears.0.weight",
                "mlps.0.linears.0.bias",
                "batch_norms.0.weight",
                "batch_norms.0.bias",
            ] {
                fresh.insert(name, t.get(name).unwrap().clone()).unwrap();
            }
            fresh
        };
        assert!(matches!(
            ModelSchema::probe(&t),
            Err(Error::MissingTensor(_))
        ));
    }

    #[test]
    fn rejects_empty_eps() {
        let mut t = tiny_table();
        let mut fresh = WeightTable::new();
        fresh.insert("eps", Tensor::vector(vec![])).unwrap();
        for name in [
            "linears_prediction.0.weight",
            "linears_prediction.0.bias",
            "linears_prediction.1.weight",
            "linears_prediction.1.bias",
        ] {
            fresh.insert(name, t.get(name).unwrap().clone()).unwrap();
        }
        t = fresh;
        assert!(matches!(
            ModelSchema::probe(&t),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn rejects_surplus_readout_head() {
        let mut t = tiny_table();
        t.insert(
            "linears_prediction.2.weight",
            Tensor::new(vec![0.0; 4], 2, 2),
        )
        .unwrap();
        t.insert("linears_prediction.2.bias", Tensor::vector(vec![0.0, 0.0]))
            .unwrap();
        let err = ModelSchema::probe(&t).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn rejects_inconsistent_head_shape() {
        let mut t = tiny_table();
        let mut fresh = WeightTable::new();
        for name in [
            "eps",
            "linears_prediction.0.weight",
            "linears_prediction.0.bias",
            "linears_prediction.1.weight",
            "mlps.0.linears.0.weight",
            "mlps.0.linears.0.bias",
            "batch_norms.0.weight",
            "batch_norms.0.bias",
        ] {
            fresh.insert(name, t.get(name).unwrap().clone()).unwrap();
        }
        // Head 1's bias has the wrong length.
        fresh
            .insert("linears_prediction.1.bias", Tensor::vector(vec![0.0; 3]))
            .unwrap();
        t = fresh;
        assert!(matches!(
            ModelSchema::probe(&t),
            Err(Error::SchemaMismatch(_))
        ));
    }
}
