//! Conjugate-direction solver interfaces.

use crate::core::traits::MatShape;
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::utils::convergence::SolveStats;

/// Common interface for the iterative solvers.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Solve A·x = b, writing result into `x`.
    ///
    /// When `initial_guess_is_zero` is false, `x` must hold the initial guess. `b` is
    /// never modified and must not alias `x`. A missing preconditioner means M = I.
    /// Returns iteration stats (including convergence info).
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
        initial_guess_is_zero: bool,
    ) -> Result<SolveStats<Self::Scalar>, Self::Error>;
}

/// Validate operator/rhs/solution sizes before any iteration work.
///
/// With a zero initial guess the solution is resized (and zero-filled) instead of checked.
pub(crate) fn check_dimensions<M, T>(
    a: &M,
    b: &[T],
    x: &mut Vec<T>,
    initial_guess_is_zero: bool,
) -> Result<usize, KError>
where
    M: MatShape + ?Sized,
    T: num_traits::Float,
{
    let (rows, cols) = (a.nrows(), a.ncols());
    let n = b.len();
    let solution_ok = initial_guess_is_zero || x.len() == cols;
    if rows != cols || n != rows || !solution_ok {
        return Err(KError::DimensionMismatch {
            rows,
            cols,
            rhs: n,
            solution: x.len(),
        });
    }
    if initial_guess_is_zero {
        x.clear();
        x.resize(n, T::zero());
    }
    Ok(n)
}

pub mod workspace;
pub use workspace::PcgWorkspace;

pub mod pcg;
pub use pcg::PcgSolver;

pub mod reortho;
pub use reortho::{CachedDirection, ReorthoCache, ReorthoPcgSolver};

pub(crate) mod block_kernel;

pub mod block_pcg;
pub use block_pcg::BlockPcgSolver;
