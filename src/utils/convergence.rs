//! Convergence tracking & tolerance checks for iterative solvers.

use crate::strategy::{
    ConvergenceCriterion, FreshCopy, MaxIterations, StagnationDetector,
};
use num_traits::Float;

/// Stopping criteria: convergence test, iteration budget and optional stagnation detection.
#[derive(Debug, Clone)]
pub struct Convergence<T> {
    pub criterion: ConvergenceCriterion<T>,
    pub max_iters: MaxIterations,
    pub stagnation: Option<StagnationDetector<T>>,
}

/// Outcome of one convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Converged,
    Stagnated,
    Running,
}

/// Immutable record returned by every solve.
#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub algorithm: &'static str,
    pub iterations: usize,
    /// Residual ratio as defined by the convergence criterion, at exit.
    pub residual_ratio: T,
    pub converged: bool,
    pub stagnated: bool,
    pub criterion: String,
}

impl<T: Float> Convergence<T> {
    /// ‖r‖/‖b‖ ≤ `tol` with a fixed iteration budget.
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            criterion: ConvergenceCriterion::RhsRelative { tol },
            max_iters: MaxIterations::Fixed(max_iters),
            stagnation: None,
        }
    }

    /// Per-solve monitor built from fresh copies of the configured policies.
    pub fn start(&self, rhs_norm: T, initial_residual_norm: T, order: usize) -> ConvergenceMonitor<T> {
        let criterion = self.criterion.fresh_copy();
        ConvergenceMonitor {
            reference: criterion.reference(rhs_norm, initial_residual_norm),
            criterion,
            max_iters: self.max_iters.fresh_copy().resolve(order),
            stagnation: self.stagnation.as_ref().map(FreshCopy::fresh_copy),
        }
    }
}

impl<T: Float> FreshCopy for Convergence<T> {
    fn fresh_copy(&self) -> Self {
        Self {
            criterion: self.criterion.fresh_copy(),
            max_iters: self.max_iters.fresh_copy(),
            stagnation: self.stagnation.as_ref().map(FreshCopy::fresh_copy),
        }
    }
}

/// Convergence state of a single solve.
#[derive(Debug)]
pub struct ConvergenceMonitor<T> {
    criterion: ConvergenceCriterion<T>,
    reference: T,
    max_iters: usize,
    stagnation: Option<StagnationDetector<T>>,
}

impl<T: Float> ConvergenceMonitor<T> {
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    pub fn tolerance(&self) -> Option<T> {
        self.criterion.tolerance()
    }

    pub fn ratio(&self, res_norm: T) -> T {
        res_norm / self.reference
    }

    /// Check the starting guess. Seeds the stagnation history.
    pub fn check_initial(&mut self, ratio: T) -> Status {
        if let Some(det) = self.stagnation.as_mut() {
            det.initialize(ratio);
        }
        if self.criterion.is_satisfied(ratio) { Status::Converged } else { Status::Running }
    }

    /// Check the ratio reached after a completed iteration.
    pub fn check(&mut self, ratio: T) -> Status {
        if self.criterion.is_satisfied(ratio) {
            return Status::Converged;
        }
        match self.stagnation.as_mut() {
            Some(det) => {
                if det.has_stagnated(ratio) { Status::Stagnated } else { Status::Running }
            }
            None => Status::Running,
        }
    }

    pub fn stats(
        &self,
        algorithm: &'static str,
        iterations: usize,
        residual_ratio: T,
        status: Status,
    ) -> SolveStats<T> {
        SolveStats {
            algorithm,
            iterations,
            residual_ratio,
            converged: status == Status::Converged,
            stagnated: status == Status::Stagnated,
            criterion: self.criterion.describe(),
        }
    }
}
