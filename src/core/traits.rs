//! Core linear-algebra traits for pcgkit.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x. `x` is not modified; `y` is pre-sized by the caller.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Operator dimensions.
pub trait MatShape {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
}

/// Inner products & norms.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}
