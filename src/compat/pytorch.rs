//! PyTorch state-dict text export parser.
//!
//! The export is a sequence of records, one per named tensor:
//!
//! ```text
//! <name>
//! 1 <cols>            # vector: one value line follows
//! <v0> <v1> ... <vC>
//! <name>
//! 2 <rows> <cols>     # matrix: `rows` value lines follow
//! <v00> ... <v0C>
//! ...
//! ```
//!
//! Names are the dotted state-dict keys (`mlps.0.linears.1.bias`,
//! `batch_norms.0.running_mean`, `eps`, ...). Weight matrices are
//! `(output_dim × input_dim)`, row-major by output channel; vectors are
//! single-row tensors.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::linalg::Matrix;

/// Error type for weight-file parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of input while reading {context} of `{name}`")]
    UnexpectedEnd { name: String, context: &'static str },
    #[error("tensor `{name}`: invalid size line `{line}`")]
    InvalidSize { name: String, line: String },
    #[error("tensor `{name}`: unsupported rank {rank} (only 1 and 2)")]
    UnsupportedRank { name: String, rank: i64 },
    #[error("tensor `{name}`, row {row}: expected {expected} values, got {actual}")]
    RowLength {
        name: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate tensor `{0}`")]
    Duplicate(String),
}

/// One named tensor: a shaped, row-major f32 buffer.
///
/// A vector is stored as a 1-row tensor, matching the export convention.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl Tensor {
    /// Create a tensor from row-major values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != rows * cols`.
    pub fn new(values: Vec<f32>, rows: usize, cols: usize) -> Self {
        assert_eq!(
            values.len(),
            rows * cols,
            "Value count {} does not match shape {}x{}",
            values.len(),
            rows,
            cols
        );
        Self { rows, cols, values }
    }

    /// Create a 1-row vector tensor.
    pub fn vector(values: Vec<f32>) -> Self {
        let cols = values.len();
        Self::new(values, 1, cols)
    }

    /// Shape as `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether this tensor is a single-row vector.
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rows == 1
    }

    /// Row-major values.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// A parsed weight export: dotted tensor names to shaped values.
///
/// The model constructor never touches raw entries; it goes through
/// [`WeightTable::vector`] and [`WeightTable::matrix`], which turn absent
/// keys and rank surprises into typed errors.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    tensors: HashMap<String, Tensor>,
}

impl WeightTable {
    /// An empty table (useful for assembling models in tests).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a weight export from a file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ParseError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Parse a weight export from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> std::result::Result<Self, ParseError> {
        let mut lines = reader.lines();
        let mut table = WeightTable::new();

        while let Some(name) = next_nonempty(&mut lines)? {
            let name = name.trim().to_string();
            let size_line = next_nonempty(&mut lines)?.ok_or(ParseError::UnexpectedEnd {
                name: name.clone(),
                context: "size line",
            })?;
            let dims: Vec<i64> = size_line
                .split_whitespace()
                .map(|t| t.parse())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| ParseError::InvalidSize {
                    name: name.clone(),
                    line: size_line.trim().to_string(),
                })?;
            let (rows, cols) = match dims.as_slice() {
                [1, c] if *c >= 0 => (1usize, *c as usize),
                [2, r, c] if *r >= 0 && *c >= 0 => (*r as usize, *c as usize),
                [rank, ..] if *rank != 1 && *rank != 2 => {
                    return Err(ParseError::UnsupportedRank {
                        name,
                        rank: *rank,
                    })
                }
                _ => {
                    return Err(ParseError::InvalidSize {
                        name,
                        line: size_line.trim().to_string(),
                    })
                }
            };

            let mut values = Vec::with_capacity(rows * cols);
            for row in 0..rows {
                let line = next_nonempty(&mut lines)?.ok_or(ParseError::UnexpectedEnd {
                    name: name.clone(),
                    context: "value row",
                })?;
                let parsed: std::result::Result<Vec<f32>, _> =
                    line.split_whitespace().map(|t| t.parse()).collect();
                let row_values = parsed.map_err(|_| ParseError::InvalidSize {
                    name: name.clone(),
                    line: line.trim().to_string(),
                })?;
                if row_values.len() != cols {
                    return Err(ParseError::RowLength {
                        name,
                        row,
                        expected: cols,
                        actual: row_values.len(),
                    });
                }
                values.extend(row_values);
            }
            table.insert(name, Tensor::new(values, rows, cols))?;
        }
        Ok(table)
    }

    /// Insert a tensor, rejecting duplicate names.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        tensor: Tensor,
    ) -> std::result::Result<(), ParseError> {
        let name = name.into();
        if self.tensors.contains_key(&name) {
            return Err(ParseError::Duplicate(name));
        }
        self.tensors.insert(name, tensor);
        Ok(())
    }

    /// Number of tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether the table holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Whether a tensor with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Raw tensor lookup.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    /// Look up a vector (1-row tensor) by name.
    pub fn vector(&self, name: &str) -> Result<&[f32]> {
        let tensor = self
            .tensors
            .get(name)
            .ok_or_else(|| Error::MissingTensor(name.to_string()))?;
        if !tensor.is_vector() {
            return Err(Error::SchemaMismatch(format!(
                "`{name}` should be a vector, found shape {:?}",
                tensor.shape()
            )));
        }
        Ok(tensor.values())
    }

    /// Look up a tensor by name and materialize it as a [`Matrix`].
    pub fn matrix(&self, name: &str) -> Result<Matrix> {
        let tensor = self
            .tensors
            .get(name)
            .ok_or_else(|| Error::MissingTensor(name.to_string()))?;
        Ok(Matrix::from_vec(
            tensor.values().to_vec(),
            tensor.rows,
            tensor.cols,
        ))
    }
}

fn next_nonempty<I: Iterator<Item = std::io::Result<String>>>(
    lines: &mut I,
) -> std::result::Result<Option<String>, ParseError> {
    for line in lines {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
eps
1 2
0.1 -0.2
mlps.0.linears.0.weight
2 2 3
1 2 3
4 5 6
mlps.0.linears.0.bias
1 2
0.5 -0.5
";

    #[test]
    fn parses_vectors_and_matrices() {
        let table = WeightTable::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(table.len(), 3);

        assert_eq!(table.vector("eps").unwrap(), &[0.1, -0.2]);
        let w = table.matrix("mlps.0.linears.0.weight").unwrap();
        assert_eq!(w.shape(), (2, 3));
        assert_eq!(w.row(1), &[4.0, 5.0, 6.0]);
        assert!(table.contains("mlps.0.linears.0.bias"));
    }

    #[test]
    fn missing_tensor_is_typed() {
        let table = WeightTable::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert!(matches!(
            table.vector("linears_prediction.0.bias"),
            Err(Error::MissingTensor(_))
        ));
    }

    #[test]
    fn matrix_where_vector_expected() {
        let table = WeightTable::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert!(matches!(
            table.vector("mlps.0.linears.0.weight"),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn rejects_short_value_row() {
        let text = "w\n2 2 3\n1 2 3\n4 5\n";
        assert!(matches!(
            WeightTable::from_reader(Cursor::new(text)),
            Err(ParseError::RowLength { row: 1, .. })
        ));
    }

    #[test]
    fn rejects_unsupported_rank() {
        let text = "w\n3 2 2 2\n";
        assert!(matches!(
            WeightTable::from_reader(Cursor::new(text)),
            Err(ParseError::UnsupportedRank { rank: 3, .. })
        ));
    }

    #[test]
    fn rejects_truncated_record() {
        let text = "w\n2 2 2\n1 2\n";
        assert!(matches!(
            WeightTable::from_reader(Cursor::new(text)),
            Err(ParseError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let text = "w\n1 1\n0\nw\n1 1\n0\n";
        assert!(matches!(
            WeightTable::from_reader(Cursor::new(text)),
            Err(ParseError::Duplicate(_))
        ));
    }

    #[test]
    fn skips_blank_lines() {
        let text = "\nw\n\n1 2\n\n0.5 1.5\n\n";
        let table = WeightTable::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(table.vector("w").unwrap(), &[0.5, 1.5]);
    }
}
