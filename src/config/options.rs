//! Command-line or API options for the conjugate-gradient solvers.
//!
//! `SolverOptions` gathers the knobs of every solver variant in one plain struct so a
//! caller can parse them once (e.g. from command-line flags) and hand them to
//! [`KspContext`](crate::context::KspContext).

use std::str::FromStr;

use crate::error::KError;
use crate::strategy::{BetaRule, MaxIterations, ResidualUpdate};

/// Which solver variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Standard preconditioned conjugate gradient
    Pcg,
    /// PCG with a persistent reorthogonalization cache
    ReorthoPcg,
    /// s-step block PCG
    BlockPcg,
}

impl FromStr for SolverKind {
    type Err = KError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pcg" | "cg" => Ok(SolverKind::Pcg),
            "reortho" | "reortho-pcg" | "reorthogonalized" => Ok(SolverKind::ReorthoPcg),
            "block" | "block-pcg" | "s-step" => Ok(SolverKind::BlockPcg),
            _ => Err(KError::Unsupported("solver kind (expected pcg, reortho or block)")),
        }
    }
}

/// Solver types & parameters.
#[derive(Debug, Clone)]
pub struct SolverOptions<T> {
    pub kind: SolverKind,
    /// Relative tolerance on ‖b − Ax‖ / ‖b‖
    pub tol: T,
    pub max_iters: MaxIterations,
    pub beta: BetaRule,
    /// Exact residual recomputation period; `None` keeps the cheap recurrence
    pub residual_period: Option<usize>,
    /// Window of the stagnation detector; `None` disables detection
    pub stagnation_span: Option<usize>,
    /// Stagnation tolerance; `None` calibrates it from the first window
    pub stagnation_tol: Option<T>,
    /// Iterations per block (block PCG only)
    pub block_size: usize,
    /// Cached directions kept (reorthogonalized PCG only); `None` keeps all
    pub cache_capacity: Option<usize>,
}

impl<T> SolverOptions<T> {
    pub fn residual_update(&self) -> ResidualUpdate {
        match self.residual_period {
            Some(period) => ResidualUpdate::Periodic { period },
            None => ResidualUpdate::Recurrence,
        }
    }
}

impl<T: num_traits::Float> Default for SolverOptions<T> {
    fn default() -> Self {
        Self {
            kind: SolverKind::Pcg,
            tol: T::from(1e-8).unwrap_or_else(T::epsilon),
            max_iters: MaxIterations::default(),
            beta: BetaRule::default(),
            residual_period: None,
            stagnation_span: None,
            stagnation_tol: None,
            block_size: 4,
            cache_capacity: None,
        }
    }
}
