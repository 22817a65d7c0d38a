//! Dense matrix algebra for the forward pass.
//!
//! [`Matrix`] is a plain row-major `f32` buffer with the operations the
//! GIN pipeline needs: elementwise arithmetic, matrix product, transpose,
//! activations, and per-row/column extremum search. Dimensions are fixed
//! at construction; every binary operation validates operand shapes and
//! returns [`Error::ShapeMismatch`] on disagreement — there is no implicit
//! broadcasting anywhere in this module.
//!
//! Orientation convention: network activations are stored channel-major,
//! rows = channels and columns = batch items. Node representations are
//! stored node-major (rows = nodes); the model transposes between the two
//! at the aggregation/MLP boundary. Transposes always materialize a new
//! owned matrix, never an aliased view.

use crate::error::{Error, Result};

/// Elementwise activation kinds.
///
/// `Sigmoid` and `Tanh` clamp their input at +10 before exponentiating.
/// The clamp is one-sided: large negative inputs decay to 0/-1 on their
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
}

impl Activation {
    #[inline]
    fn apply(self, v: f32) -> f32 {
        match self {
            Activation::Sigmoid => {
                let m = if v > 10.0 { 10.0 } else { v };
                let e = m.exp();
                e / (1.0 + e)
            }
            Activation::Tanh => {
                let m = if v > 10.0 { 10.0 } else { v };
                let e = m.exp();
                (e - e.recip()) / (e + e.recip())
            }
            Activation::Relu => {
                if v < 0.0 {
                    0.0
                } else {
                    v
                }
            }
        }
    }
}

/// Axis selector for [`Matrix::argmax`] / [`Matrix::argmin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Scan along one row (the result indexes a column).
    Row,
    /// Scan along one column (the result indexes a row).
    Col,
}

/// Dense `f32` matrix with fixed dimensions and row-major flat storage.
///
/// # Example
///
/// ```
/// use ginfer::linalg::Matrix;
///
/// let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
/// let b = Matrix::identity(2);
/// let c = a.matmul(&b).unwrap();
/// assert_eq!(c, a);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Box<[f32]>,
    num_rows: usize,
    num_cols: usize,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            data: vec![0.0; num_rows * num_cols].into_boxed_slice(),
            num_rows,
            num_cols,
        }
    }

    /// Create an identity matrix of size `n`.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Create a matrix from a row-major Vec, taking ownership.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != num_rows * num_cols`.
    pub fn from_vec(data: Vec<f32>, num_rows: usize, num_cols: usize) -> Self {
        assert_eq!(
            data.len(),
            num_rows * num_cols,
            "Data length {} does not match dimensions {}x{}",
            data.len(),
            num_rows,
            num_cols
        );
        Self {
            data: data.into_boxed_slice(),
            num_rows,
            num_cols,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Shape as `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows, self.num_cols)
    }

    /// Element at `(row, col)`, or `None` out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.num_rows || col >= self.num_cols {
            return None;
        }
        Some(self.data[row * self.num_cols + col])
    }

    /// Set the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(
            row < self.num_rows && col < self.num_cols,
            "Index ({row}, {col}) out of bounds for {}x{} matrix",
            self.num_rows,
            self.num_cols
        );
        self.data[row * self.num_cols + col] = value;
    }

    /// One row as a contiguous slice. O(1).
    ///
    /// # Panics
    ///
    /// Panics if `row >= num_rows`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        assert!(row < self.num_rows, "Row index {row} out of bounds");
        let start = row * self.num_cols;
        &self.data[start..start + self.num_cols]
    }

    /// One row as a mutable slice. O(1).
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        assert!(row < self.num_rows, "Row index {row} out of bounds");
        let start = row * self.num_cols;
        &mut self.data[start..start + self.num_cols]
    }

    /// One column, copied (strided access).
    ///
    /// # Panics
    ///
    /// Panics if `col >= num_cols`.
    pub fn column(&self, col: usize) -> Vec<f32> {
        assert!(col < self.num_cols, "Column index {col} out of bounds");
        (0..self.num_rows)
            .map(|r| self.data[r * self.num_cols + col])
            .collect()
    }

    /// Raw row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume into the row-major backing Vec.
    pub fn into_vec(self) -> Vec<f32> {
        self.data.into_vec()
    }

    /// Overwrite this matrix with the contents of `other`.
    pub fn copy_from(&mut self, other: &Matrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                op: "copy_from",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    fn zip_with(&self, other: &Matrix, op: &'static str, f: impl Fn(f32, f32) -> f32) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                op,
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Matrix {
            data,
            num_rows: self.num_rows,
            num_cols: self.num_cols,
        })
    }

    /// Elementwise sum. Shapes must match exactly.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference. Shapes must match exactly.
    pub fn sub(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise (Hadamard) product. Shapes must match exactly.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// Scale every element by `k`.
    pub fn scale(&self, k: f32) -> Matrix {
        let data = self.data.iter().map(|&v| v * k).collect();
        Matrix {
            data,
            num_rows: self.num_rows,
            num_cols: self.num_cols,
        }
    }

    /// Standard matrix product `self × other`.
    ///
    /// `(m×k) × (k×n) → (m×n)`. The result is a fresh allocation, so the
    /// product is safe even when `other` is `self`.
    ///
    /// Inner products accumulate left to right over `k`; the iteration
    /// order is fixed, so repeated calls are bit-identical.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.num_cols != other.num_rows {
            return Err(Error::ShapeMismatch {
                op: "matmul",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        let mut out = Matrix::zeros(self.num_rows, other.num_cols);
        for i in 0..self.num_rows {
            let lhs_row = self.row(i);
            let start = i * out.num_cols;
            let out_row = &mut out.data[start..start + other.num_cols];
            for (k, &a) in lhs_row.iter().enumerate() {
                let rhs_row = other.row(k);
                for (o, &b) in out_row.iter_mut().zip(rhs_row.iter()) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    /// Materialized transpose.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.num_cols, self.num_rows);
        for r in 0..self.num_rows {
            for (c, &v) in self.row(r).iter().enumerate() {
                out.data[c * self.num_rows + r] = v;
            }
        }
        out
    }

    /// Apply an activation elementwise, producing a new matrix.
    pub fn activation(&self, kind: Activation) -> Matrix {
        let data = self.data.iter().map(|&v| kind.apply(v)).collect();
        Matrix {
            data,
            num_rows: self.num_rows,
            num_cols: self.num_cols,
        }
    }

    /// Index of the maximum value along a row or column.
    ///
    /// Ties keep the first occurrence of a left-to-right scan: a later
    /// equal value never overwrites the winner.
    pub fn argmax(&self, axis: Axis, index: usize) -> Result<usize> {
        self.extremum(axis, index, "argmax", |candidate, best| candidate > best)
    }

    /// Index of the minimum value along a row or column.
    /// First-occurrence tie-break, as for [`Matrix::argmax`].
    pub fn argmin(&self, axis: Axis, index: usize) -> Result<usize> {
        self.extremum(axis, index, "argmin", |candidate, best| candidate < best)
    }

    fn extremum(
        &self,
        axis: Axis,
        index: usize,
        op: &'static str,
        better: impl Fn(f32, f32) -> bool,
    ) -> Result<usize> {
        let (len, bound) = match axis {
            Axis::Row => (self.num_cols, self.num_rows),
            Axis::Col => (self.num_rows, self.num_cols),
        };
        if index >= bound {
            return Err(Error::IndexOutOfBounds {
                op,
                index,
                len: bound,
            });
        }
        if len == 0 {
            return Err(Error::IndexOutOfBounds { op, index: 0, len: 0 });
        }
        let at = |i: usize| match axis {
            Axis::Row => self.data[index * self.num_cols + i],
            Axis::Col => self.data[i * self.num_cols + index],
        };
        let mut best_idx = 0;
        let mut best = at(0);
        for i in 1..len {
            let v = at(i);
            if better(v, best) {
                best = v;
                best_idx = i;
            }
        }
        Ok(best_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn from_vec_shape() {
        let m = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(1), vec![2.0, 5.0]);
    }

    #[test]
    #[should_panic(expected = "does not match dimensions")]
    fn from_vec_wrong_len_panics() {
        Matrix::from_vec(vec![1.0, 2.0, 3.0], 2, 2);
    }

    #[test]
    fn get_set() {
        let mut m = Matrix::zeros(2, 2);
        m.set(1, 0, 7.0);
        assert_eq!(m.get(1, 0), Some(7.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 2), None);
    }

    #[test]
    fn add_sub_hadamard() {
        let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = Matrix::from_vec(vec![5.0, 6.0, 7.0, 8.0], 2, 2);

        assert_eq!(a.add(&b).unwrap().as_slice(), &[6.0, 8.0, 10.0, 12.0]);
        assert_eq!(b.sub(&a).unwrap().as_slice(), &[4.0, 4.0, 4.0, 4.0]);
        assert_eq!(a.hadamard(&b).unwrap().as_slice(), &[5.0, 12.0, 21.0, 32.0]);
    }

    #[test]
    fn elementwise_shape_mismatch() {
        let a = Matrix::zeros(2, 2);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(
            a.add(&b),
            Err(Error::ShapeMismatch { op: "add", .. })
        ));
    }

    #[test]
    fn matmul_values() {
        let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = Matrix::from_vec(vec![5.0, 6.0, 7.0, 8.0], 2, 2);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn matmul_shape_conformance() {
        // (m×k) × (k×n) always yields (m×n); non-conformant pairs always fail.
        for (m, k, n) in [(1, 1, 1), (2, 3, 4), (4, 1, 5)] {
            let a = Matrix::zeros(m, k);
            let b = Matrix::zeros(k, n);
            assert_eq!(a.matmul(&b).unwrap().shape(), (m, n));
        }
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(4, 2);
        assert!(matches!(
            a.matmul(&b),
            Err(Error::ShapeMismatch { op: "matmul", .. })
        ));
    }

    #[test]
    fn matmul_with_self_operand() {
        let a = Matrix::from_vec(vec![0.0, 1.0, 1.0, 0.0], 2, 2);
        let sq = a.matmul(&a).unwrap();
        assert_eq!(sq, Matrix::identity(2));
    }

    #[test]
    fn transpose_involution() {
        let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.row(0), &[1.0, 4.0]);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn scale_and_copy_from() {
        let a = Matrix::from_vec(vec![1.0, -2.0], 1, 2);
        assert_eq!(a.scale(2.5).as_slice(), &[2.5, -5.0]);

        let mut b = Matrix::zeros(1, 2);
        b.copy_from(&a).unwrap();
        assert_eq!(b, a);
        let mut c = Matrix::zeros(2, 1);
        assert!(c.copy_from(&a).is_err());
    }

    #[test]
    fn relu() {
        let a = Matrix::from_vec(vec![-1.0, 0.0, 2.5], 1, 3);
        assert_eq!(a.activation(Activation::Relu).as_slice(), &[0.0, 0.0, 2.5]);
    }

    #[test]
    fn sigmoid_clamps_positive_side_only() {
        let a = Matrix::from_vec(vec![0.0, 10.0, 50.0, -50.0], 1, 4);
        let s = a.activation(Activation::Sigmoid);
        assert_approx_eq!(s.get(0, 0).unwrap(), 0.5, 1e-6);
        // Inputs past +10 saturate at sigmoid(10).
        assert_eq!(s.get(0, 1), s.get(0, 2));
        // The clamp is one-sided: large negative inputs decay naturally.
        assert!(s.get(0, 3).unwrap() < 1e-6);
    }

    #[test]
    fn tanh_matches_reference_formula() {
        let a = Matrix::from_vec(vec![0.0, 1.0, 50.0], 1, 3);
        let t = a.activation(Activation::Tanh);
        assert_approx_eq!(t.get(0, 0).unwrap(), 0.0, 1e-6);
        assert_approx_eq!(t.get(0, 1).unwrap(), 1.0f32.tanh(), 1e-5);
        // Saturates at tanh(10) because of the clamp.
        assert_approx_eq!(t.get(0, 2).unwrap(), 10.0f32.tanh(), 1e-5);
    }

    #[test]
    fn argmax_first_occurrence_ties() {
        let m = Matrix::from_vec(vec![1.0, 3.0, 3.0, 2.0], 1, 4);
        assert_eq!(m.argmax(Axis::Row, 0).unwrap(), 1);

        let m = Matrix::from_vec(vec![2.0, 0.0, 0.0, 5.0], 4, 1);
        assert_eq!(m.argmin(Axis::Col, 0).unwrap(), 1);
    }

    #[test]
    fn argmax_by_column() {
        let m = Matrix::from_vec(vec![1.0, 9.0, 4.0, 2.0], 2, 2);
        assert_eq!(m.argmax(Axis::Col, 0).unwrap(), 1);
        assert_eq!(m.argmax(Axis::Col, 1).unwrap(), 0);
    }

    #[test]
    fn argmax_out_of_bounds() {
        let m = Matrix::zeros(2, 2);
        assert!(matches!(
            m.argmax(Axis::Row, 2),
            Err(Error::IndexOutOfBounds { op: "argmax", .. })
        ));
    }
}
