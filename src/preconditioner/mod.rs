//! Preconditioners for the conjugate-gradient solvers.
//!
//! This module defines the `Preconditioner` trait the solvers consume. Concrete
//! preconditioners live outside the solver core; `Jacobi` is provided as a small,
//! dependency-free collaborator.

use crate::error::KError;

/// A preconditioner M ≈ A⁻¹.
///
/// For the conjugate-gradient family M must be symmetric positive definite and its
/// `apply` must be deterministic for a fixed setup.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), KError> {
        Ok(())
    }
    /// Refresh internal structures after the system matrix changed.
    /// `pattern_changed` signals that the sparsity pattern changed too.
    fn update(&mut self, a: &M, pattern_changed: bool) -> Result<(), KError> {
        let _ = pattern_changed;
        self.setup(a)
    }
}

/// Writes z = M⁻¹ r, or z = r when no preconditioner is given.
pub(crate) fn precondition<M, T: Copy>(
    pc: Option<&dyn Preconditioner<M, Vec<T>>>,
    r: &Vec<T>,
    z: &mut Vec<T>,
) -> Result<(), KError> {
    match pc {
        Some(pc) => pc.apply(r, z),
        None => {
            z.copy_from_slice(r);
            Ok(())
        }
    }
}

pub mod jacobi;

pub use jacobi::Jacobi;
