//! Prediction output types.

use approx::AbsDiffEq;

/// Raw class scores for a batch of graphs: flat storage with shape
/// metadata.
///
/// Row-major layout, one row per graph, `num_groups` values per row (one
/// per class). Scores are the summed readout-head outputs before any
/// normalization; [`PredictionOutput::best_class`] turns a row into a
/// class index.
///
/// # Memory Layout
///
/// ```text
/// data[row * num_groups + group] = score for (graph, class)
/// ```
///
/// # Example
///
/// ```
/// use ginfer::predict::PredictionOutput;
///
/// // 2 graphs, 3 classes
/// let output = PredictionOutput::new(vec![0.1, 0.7, -0.2, 0.4, 0.4, 0.3], 2, 3);
///
/// assert_eq!(output.row(0), &[0.1, 0.7, -0.2]);
/// assert_eq!(output.best_class(0), 1);
/// // Ties resolve to the first occurrence.
/// assert_eq!(output.best_class(1), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutput {
    /// Flat data in row-major layout.
    data: Vec<f32>,
    /// Number of rows (graphs).
    num_rows: usize,
    /// Number of groups (classes).
    num_groups: usize,
}

impl PredictionOutput {
    /// Create a new prediction output.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != num_rows * num_groups`.
    pub fn new(data: Vec<f32>, num_rows: usize, num_groups: usize) -> Self {
        assert_eq!(
            data.len(),
            num_rows * num_groups,
            "Data length {} does not match shape {}x{}",
            data.len(),
            num_rows,
            num_groups
        );
        Self {
            data,
            num_rows,
            num_groups,
        }
    }

    /// Create an output initialized to zeros.
    pub fn zeros(num_rows: usize, num_groups: usize) -> Self {
        Self {
            data: vec![0.0; num_rows * num_groups],
            num_rows,
            num_groups,
        }
    }

    /// Number of rows (graphs).
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of groups (classes).
    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Shape as (rows, groups).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_groups)
    }

    /// Scores for a single graph.
    ///
    /// # Panics
    ///
    /// Panics if `row_idx >= num_rows`.
    #[inline]
    pub fn row(&self, row_idx: usize) -> &[f32] {
        let start = row_idx * self.num_groups;
        &self.data[start..start + self.num_groups]
    }

    /// Mutable scores for a single graph.
    ///
    /// # Panics
    ///
    /// Panics if `row_idx >= num_rows`.
    #[inline]
    pub fn row_mut(&mut self, row_idx: usize) -> &mut [f32] {
        let start = row_idx * self.num_groups;
        &mut self.data[start..start + self.num_groups]
    }

    /// Iterate over per-graph score rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.num_groups)
    }

    /// Raw flat data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume and return raw data.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Class index with the highest score for one graph.
    ///
    /// Ties resolve to the lowest class index (strict-greater scan).
    ///
    /// # Panics
    ///
    /// Panics if `row_idx >= num_rows` or the output has zero groups.
    pub fn best_class(&self, row_idx: usize) -> usize {
        let row = self.row(row_idx);
        assert!(!row.is_empty(), "Cannot take argmax of an empty score row");
        let mut best = 0;
        for (i, &v) in row.iter().enumerate() {
            if v > row[best] {
                best = i;
            }
        }
        best
    }

    /// Best class for every graph, in row order.
    pub fn best_classes(&self) -> Vec<usize> {
        (0..self.num_rows).map(|r| self.best_class(r)).collect()
    }
}

impl AbsDiffEq for PredictionOutput {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.num_rows == other.num_rows
            && self.num_groups == other.num_groups
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}
