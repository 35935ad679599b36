//! Factory and context holder for the conjugate-gradient solvers.
//!
//! `KspContext` owns the operator, an optional preconditioner and one solver built from
//! [`SolverOptions`]. The solver is kept between `solve_context` calls, so a
//! reorthogonalized solver reuses its direction cache across a sequence of related
//! right-hand sides until the operator is replaced through
//! [`KspContext::update_operator`].
//!
//! # Usage
//!
//! 1. Construct a `KspContext` with the matrix, preconditioner and options.
//! 2. Call `solve_context` for each right-hand side.
//! 3. Call `update_operator` when the matrix changes (refreshes the preconditioner and
//!    drops cached directions).

use tracing::debug;

use crate::config::{SolverKind, SolverOptions};
use crate::core::traits::{InnerProduct, MatShape, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::{BlockPcgSolver, LinearSolver, PcgSolver, ReorthoPcgSolver};
use crate::strategy::{ConvergenceCriterion, StagnationDetector};
use crate::utils::convergence::SolveStats;
use num_traits::Float;

/// The solver instance held by a context.
pub enum KspSolver<T> {
    Pcg(PcgSolver<T>),
    ReorthoPcg(ReorthoPcgSolver<T>),
    BlockPcg(BlockPcgSolver<T>),
}

impl<T: Float> KspSolver<T> {
    /// Build the solver described by `opts`.
    pub fn from_options(opts: &SolverOptions<T>) -> Self {
        let criterion = ConvergenceCriterion::RhsRelative { tol: opts.tol };
        let stagnation = opts
            .stagnation_span
            .map(|span| StagnationDetector::new(span, opts.stagnation_tol));
        macro_rules! configure {
            ($solver:expr) => {{
                let solver = $solver
                    .with_criterion(criterion)
                    .with_max_iters(opts.max_iters)
                    .with_residual_update(opts.residual_update());
                match stagnation {
                    Some(det) => solver.with_stagnation(det),
                    None => solver,
                }
            }};
        }
        match opts.kind {
            SolverKind::Pcg => {
                KspSolver::Pcg(configure!(PcgSolver::new(opts.tol, 0).with_beta(opts.beta)))
            }
            SolverKind::ReorthoPcg => {
                let solver = ReorthoPcgSolver::new(opts.tol, 0);
                let solver = match opts.cache_capacity {
                    Some(cap) => solver.with_cache_capacity(cap),
                    None => solver,
                };
                KspSolver::ReorthoPcg(configure!(solver))
            }
            SolverKind::BlockPcg => KspSolver::BlockPcg(configure!(
                BlockPcgSolver::new(opts.block_size, opts.tol, 0).with_beta(opts.beta)
            )),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            KspSolver::Pcg(_) => SolverKind::Pcg,
            KspSolver::ReorthoPcg(_) => SolverKind::ReorthoPcg,
            KspSolver::BlockPcg(_) => SolverKind::BlockPcg,
        }
    }

    pub fn residual_history(&self) -> &[T] {
        match self {
            KspSolver::Pcg(s) => s.residual_history(),
            KspSolver::ReorthoPcg(s) => s.residual_history(),
            KspSolver::BlockPcg(s) => s.residual_history(),
        }
    }
}

/// Context and configuration for a conjugate-gradient solve.
pub struct KspContext<M, T> {
    /// The system operator
    pub a: M,
    /// Optional preconditioner; `None` means M = I
    pub pc: Option<Box<dyn Preconditioner<M, Vec<T>>>>,
    solver: KspSolver<T>,
}

impl<M, T> KspContext<M, T>
where
    M: MatVec<Vec<T>> + MatShape,
    (): InnerProduct<Vec<T>, Scalar = T>,
    T: Float + From<f64>,
{
    /// Set up the preconditioner against `a` and build the solver from `opts`.
    pub fn new(
        a: M,
        mut pc: Option<Box<dyn Preconditioner<M, Vec<T>>>>,
        opts: &SolverOptions<T>,
    ) -> Result<Self, KError> {
        if let Some(pc) = pc.as_mut() {
            pc.setup(&a)?;
        }
        Ok(Self { a, pc, solver: KspSolver::from_options(opts) })
    }

    pub fn solver(&self) -> &KspSolver<T> {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut KspSolver<T> {
        &mut self.solver
    }

    /// Solve `A x = b` with the configured solver and preconditioner.
    pub fn solve_context(
        &mut self,
        b: &Vec<T>,
        x: &mut Vec<T>,
        initial_guess_is_zero: bool,
    ) -> Result<SolveStats<T>, KError> {
        let pc = self.pc.as_deref();
        match &mut self.solver {
            KspSolver::Pcg(s) => s.solve(&self.a, pc, b, x, initial_guess_is_zero),
            KspSolver::ReorthoPcg(s) => s.solve(&self.a, pc, b, x, initial_guess_is_zero),
            KspSolver::BlockPcg(s) => s.solve(&self.a, pc, b, x, initial_guess_is_zero),
        }
    }

    /// Replace the operator, refresh the preconditioner and drop cached directions
    /// that belong to the old operator.
    pub fn update_operator(&mut self, a: M, pattern_changed: bool) -> Result<(), KError> {
        self.a = a;
        if let Some(pc) = self.pc.as_mut() {
            pc.update(&self.a, pattern_changed)?;
        }
        if let KspSolver::ReorthoPcg(s) = &mut self.solver {
            debug!(dropped = s.cache.len(), "operator replaced, clearing direction cache");
            s.clear();
        }
        Ok(())
    }
}
