//! Full-length vector kernels shared by the solvers.

use crate::core::traits::MatVec;
use num_traits::Float;

/// y ← y + α x
#[inline]
pub fn axpy<T: Float>(alpha: T, x: &[T], y: &mut [T]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = *yi + alpha * xi;
    }
}

/// y ← x + β y
#[inline]
pub fn xpby<T: Float>(x: &[T], beta: T, y: &mut [T]) {
    assert_eq!(x.len(), y.len(), "xpby: length mismatch");
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = xi + beta * *yi;
    }
}

/// r ← b − A x
pub fn exact_residual<M, T>(a: &M, b: &Vec<T>, x: &Vec<T>, r: &mut Vec<T>)
where
    M: MatVec<Vec<T>> + ?Sized,
    T: Float,
{
    a.matvec(x, r);
    for (ri, &bi) in r.iter_mut().zip(b) {
        *ri = bi - *ri;
    }
}
