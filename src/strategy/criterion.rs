//! Convergence criteria on the residual norm.

use super::FreshCopy;
use num_traits::Float;

/// Turns ‖r‖ into a residual ratio and compares it to a tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvergenceCriterion<T> {
    /// ‖r‖ / ‖b‖ ≤ tol
    RhsRelative { tol: T },
    /// ‖r‖ / ‖r₀‖ ≤ tol
    InitialResidualRelative { tol: T },
    /// ‖r‖ ≤ tol
    Absolute { tol: T },
    /// Never satisfied; runs the full iteration budget (benchmarking).
    Never,
}

impl<T: Float> ConvergenceCriterion<T> {
    /// Denominator of the residual ratio. Falls back to 1 when the reference norm is zero.
    pub fn reference(&self, rhs_norm: T, initial_residual_norm: T) -> T {
        let denom = match self {
            ConvergenceCriterion::RhsRelative { .. } => rhs_norm,
            ConvergenceCriterion::InitialResidualRelative { .. } => initial_residual_norm,
            ConvergenceCriterion::Absolute { .. } | ConvergenceCriterion::Never => T::one(),
        };
        if denom > T::zero() { denom } else { T::one() }
    }

    pub fn tolerance(&self) -> Option<T> {
        match *self {
            ConvergenceCriterion::RhsRelative { tol }
            | ConvergenceCriterion::InitialResidualRelative { tol }
            | ConvergenceCriterion::Absolute { tol } => Some(tol),
            ConvergenceCriterion::Never => None,
        }
    }

    pub fn is_satisfied(&self, ratio: T) -> bool {
        self.tolerance().is_some_and(|tol| ratio <= tol)
    }

    /// Human-readable description for the stats record.
    pub fn describe(&self) -> String {
        let tol = |t: T| t.to_f64().unwrap_or(f64::NAN);
        match *self {
            ConvergenceCriterion::RhsRelative { tol: t } => {
                format!("norm2(b - A*x) / norm2(b) <= {:e}", tol(t))
            }
            ConvergenceCriterion::InitialResidualRelative { tol: t } => {
                format!("norm2(b - A*x) / norm2(b - A*x0) <= {:e}", tol(t))
            }
            ConvergenceCriterion::Absolute { tol: t } => {
                format!("norm2(b - A*x) <= {:e}", tol(t))
            }
            ConvergenceCriterion::Never => "never converges (fixed iteration count)".to_string(),
        }
    }
}

impl<T: Float> Default for ConvergenceCriterion<T> {
    fn default() -> Self {
        ConvergenceCriterion::RhsRelative {
            tol: T::from(1e-8).unwrap_or_else(T::epsilon),
        }
    }
}

impl<T: Copy> FreshCopy for ConvergenceCriterion<T> {
    fn fresh_copy(&self) -> Self {
        *self
    }
}
