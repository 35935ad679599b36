// Jacobi preconditioner implementation

use crate::core::traits::{MatShape, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Jacobi preconditioner: M⁻¹ = D⁻¹
#[derive(Debug, Clone)]
pub struct Jacobi<T> {
    pub(crate) inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// new with empty state; user must call `setup`.
    pub fn new() -> Self {
        Self { inv_diag: Vec::new() }
    }

    /// Build directly from a known diagonal.
    pub fn from_diagonal(diag: &[T]) -> Result<Self, KError> {
        let mut inv_diag = Vec::with_capacity(diag.len());
        for (i, &d) in diag.iter().enumerate() {
            if d == T::zero() {
                return Err(KError::ZeroPivot(i));
            }
            inv_diag.push(T::one() / d);
        }
        Ok(Self { inv_diag })
    }
}

impl<T: Float> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, T> Preconditioner<M, Vec<T>> for Jacobi<T>
where
    M: MatVec<Vec<T>> + MatShape,
    T: Float,
{
    fn setup(&mut self, a: &M) -> Result<(), KError> {
        let n = a.nrows();
        // Read the diagonal through the operator: d_i = (A e_i)_i
        let mut diag = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        let mut col = vec![T::zero(); n];
        for i in 0..n {
            e[i] = T::one();
            a.matvec(&e, &mut col);
            e[i] = T::zero();
            diag[i] = col[i];
        }
        *self = Self::from_diagonal(&diag)?;
        Ok(())
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), KError> {
        if self.inv_diag.len() != r.len() || r.len() != z.len() {
            return Err(KError::SolveError(format!(
                "jacobi preconditioner set up for {} rows, got r of {} and z of {}",
                self.inv_diag.len(),
                r.len(),
                z.len()
            )));
        }
        for ((zi, &ri), &di) in z.iter_mut().zip(r.iter()).zip(self.inv_diag.iter()) {
            *zi = di * ri;
        }
        Ok(())
    }
}
