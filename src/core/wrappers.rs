//! Wrappers for faer dense matrix types and vector operations.
//!
//! This module implements the core traits for `faer::Mat`, `faer::MatRef` and `Vec<T>`
//! so that dense matrices can be handed to the solvers as operators. Inner products use
//! Rayon when the `rayon` feature is enabled.

use crate::core::traits::{InnerProduct, MatShape, MatVec};
use faer::{Mat, MatRef};
use num_traits::Float;

/// Implements matrix-vector multiplication for `faer::Mat`.
///
/// Computes `y = A * x` where `A` is a dense matrix, `x` and `y` are vectors.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.as_ref().matvec(x, y)
    }
}

/// Implements matrix-vector multiplication for a matrix reference (`faer::MatRef`).
impl<'a, T: Float> MatVec<Vec<T>> for MatRef<'a, T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for (i, yi) in y.iter_mut().enumerate() {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + self[(i, j)] * xj;
            }
            *yi = acc;
        }
    }
}

impl<T> MatShape for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

impl<'a, T> MatShape for MatRef<'a, T> {
    fn nrows(&self) -> usize {
        (*self).nrows()
    }
    fn ncols(&self) -> usize {
        (*self).ncols()
    }
}

/// Implements inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;

    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }

    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &Vec<T>) -> T {
        self.dot(x, x).sqrt()
    }
}
