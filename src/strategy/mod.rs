//! Termination and update policies injected into the conjugate-gradient recurrences.
//!
//! Each policy is a small value type holding configuration (and, for stagnation
//! detection, per-solve history). Solvers call [`FreshCopy::fresh_copy`] at every
//! `solve` entry so a configured policy never carries state from a previous run.

pub mod beta;
pub mod criterion;
pub mod max_iter;
pub mod residual;
pub mod stagnation;

pub use beta::BetaRule;
pub use criterion::ConvergenceCriterion;
pub use max_iter::MaxIterations;
pub use residual::ResidualUpdate;
pub use stagnation::StagnationDetector;

/// Produce a copy carrying only the initial settings of a strategy.
pub trait FreshCopy {
    fn fresh_copy(&self) -> Self;
}
