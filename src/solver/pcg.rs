//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2
//!
//! The recurrence itself lives in [`PcgCore`], which runs the iteration over an
//! injected direction-update step. [`PcgSolver`] plugs in the classic β-update;
//! the reorthogonalized solver plugs in a projection against cached directions.
//!
//! ```text
//! r = b - A*x,  z = M^{-1} r,  p = z,  δ = r·z
//! loop:
//!     Ap = A*p
//!     if p·Ap <= 0: stagnated
//!     α = δ / (p·Ap)
//!     x += α p
//!     r  = r - α Ap       (or b - A x, per residual updater)
//!     z  = M^{-1} r
//!     δ' = r·z
//!     check ‖r‖ ratio / stagnation
//!     p  = z + β(δ', δ) p
//!     δ  = δ'
//! ```

use tracing::{debug, trace, warn};

use crate::core::traits::{InnerProduct, MatShape, MatVec};
use crate::error::KError;
use crate::preconditioner::{Preconditioner, precondition};
use crate::solver::workspace::PcgWorkspace;
use crate::solver::{LinearSolver, check_dimensions};
use crate::strategy::{BetaRule, FreshCopy, ResidualUpdate};
use crate::utils::convergence::{Convergence, SolveStats, Status};
use crate::utils::vecops::{axpy, exact_residual, xpby};
use num_traits::Float;

pub(crate) const PCG_NAME: &str = "PCG";

pub(crate) fn lossy<T: Float>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

/// Residual-ratio history plus an optional per-iteration callback.
pub struct ResidualHistory<T> {
    pub residuals: Vec<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
}

impl<T: Copy> ResidualHistory<T> {
    pub(crate) fn record(&mut self, iteration: usize, ratio: T) {
        if let Some(ref mut monitor) = self.monitor {
            monitor(iteration, ratio);
        }
        self.residuals.push(ratio);
    }
}

impl<T> Default for ResidualHistory<T> {
    fn default() -> Self {
        Self { residuals: Vec::new(), monitor: None }
    }
}

/// How the next search direction is formed from z = M⁻¹r.
pub(crate) trait DirectionUpdate<T> {
    /// Adjust the starting guess before iterating.
    fn warm_start(&mut self, _x: &mut Vec<T>, _r: &mut Vec<T>) {}
    /// Direction of the first iteration.
    fn first(&mut self, z: &Vec<T>, p: &mut Vec<T>);
    /// Direction of every later iteration. `cross` is r_new·z_old when requested.
    fn next(&mut self, z: &Vec<T>, rz_new: T, rz_old: T, cross: T, p: &mut Vec<T>);
    fn needs_cross_term(&self) -> bool {
        false
    }
    /// Called once the iteration along `p` completed.
    fn finalize(&mut self, _p: &Vec<T>, _ap: &Vec<T>, _pap: T) {}
}

/// Classic p ← z + βp.
pub(crate) struct ConjugateUpdate {
    pub rule: BetaRule,
}

impl<T: Float> DirectionUpdate<T> for ConjugateUpdate {
    fn first(&mut self, z: &Vec<T>, p: &mut Vec<T>) {
        p.copy_from_slice(z);
    }

    fn next(&mut self, z: &Vec<T>, rz_new: T, rz_old: T, cross: T, p: &mut Vec<T>) {
        let beta = self.rule.beta(rz_new, rz_old, cross);
        xpby(z, beta, p);
    }

    fn needs_cross_term(&self) -> bool {
        self.rule.needs_cross_term()
    }
}

/// State and policies shared by every conjugate-gradient variant.
pub struct PcgCore<T> {
    pub conv: Convergence<T>,
    pub residual_update: ResidualUpdate,
    pub history: ResidualHistory<T>,
    pub(crate) ws: PcgWorkspace<T>,
}

impl<T: Float> PcgCore<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            conv: Convergence::new(tol, max_iters),
            residual_update: ResidualUpdate::default(),
            history: ResidualHistory::default(),
            ws: PcgWorkspace::default(),
        }
    }
}

impl<T: Float + From<f64>> PcgCore<T> {
    /// Run the recurrence to termination. `x` must already be validated and sized.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn run<M, D>(
        &mut self,
        name: &'static str,
        a: &M,
        pc: Option<&dyn Preconditioner<M, Vec<T>>>,
        b: &Vec<T>,
        x: &mut Vec<T>,
        initial_guess_is_zero: bool,
        dir: &mut D,
    ) -> Result<SolveStats<T>, KError>
    where
        M: MatVec<Vec<T>> + MatShape,
        (): InnerProduct<Vec<T>, Scalar = T>,
        D: DirectionUpdate<T>,
    {
        let PcgCore { conv, residual_update, history, ws } = self;
        let residual_update = residual_update.fresh_copy();
        let n = b.len();
        let ip = ();
        ws.reset(n);
        history.residuals.clear();

        if initial_guess_is_zero {
            ws.r.copy_from_slice(b);
        } else {
            exact_residual(a, b, x, &mut ws.r);
        }
        let mut mon = conv.start(ip.norm(b), ip.norm(&ws.r), n);
        dir.warm_start(x, &mut ws.r);

        let mut ratio = mon.ratio(ip.norm(&ws.r));
        history.record(0, ratio);
        debug!(solver = name, n, ratio = lossy(ratio), "solve started");
        if mon.check_initial(ratio) == Status::Converged {
            return Ok(mon.stats(name, 0, ratio, Status::Converged));
        }

        precondition(pc, &ws.r, &mut ws.z)?;
        let mut rz = ip.dot(&ws.r, &ws.z);
        dir.first(&ws.z, &mut ws.p);

        let max_iters = mon.max_iters();
        for i in 0..max_iters {
            a.matvec(&ws.p, &mut ws.ap);
            let pap = ip.dot(&ws.p, &ws.ap);
            // NaN counts as breakdown too
            if !(pap > T::zero()) {
                warn!(solver = name, iteration = i, p_ap = lossy(pap), "p·Ap <= 0, stopping");
                return Ok(mon.stats(name, i, ratio, Status::Stagnated));
            }
            let alpha = rz / pap;
            axpy(alpha, &ws.p, x);
            residual_update.update(i + 1, a, b, x, &ws.ap, alpha, &mut ws.r);
            dir.finalize(&ws.p, &ws.ap, pap);

            let cross = if dir.needs_cross_term() { ip.dot(&ws.r, &ws.z) } else { T::zero() };
            precondition(pc, &ws.r, &mut ws.z)?;
            let rz_new = ip.dot(&ws.r, &ws.z);

            ratio = mon.ratio(ip.norm(&ws.r));
            history.record(i + 1, ratio);
            trace!(solver = name, iteration = i + 1, ratio = lossy(ratio), alpha = lossy(alpha));
            let status = mon.check(ratio);
            if status != Status::Running {
                debug!(solver = name, iterations = i + 1, ?status, "solve finished");
                return Ok(mon.stats(name, i + 1, ratio, status));
            }

            dir.next(&ws.z, rz_new, rz, cross, &mut ws.p);
            rz = rz_new;
        }
        debug!(solver = name, iterations = max_iters, ratio = lossy(ratio), "iteration budget exhausted");
        Ok(mon.stats(name, max_iters, ratio, Status::Running))
    }
}

/// Builder methods shared by the solver front-ends.
macro_rules! core_builders {
    ($solver:ident) => {
        impl<T: num_traits::Float> $solver<T> {
            pub fn with_criterion(mut self, criterion: $crate::strategy::ConvergenceCriterion<T>) -> Self {
                self.core.conv.criterion = criterion;
                self
            }
            pub fn with_max_iters(mut self, max_iters: $crate::strategy::MaxIterations) -> Self {
                self.core.conv.max_iters = max_iters;
                self
            }
            pub fn with_stagnation(mut self, detector: $crate::strategy::StagnationDetector<T>) -> Self {
                self.core.conv.stagnation = Some(detector);
                self
            }
            pub fn with_residual_update(mut self, update: $crate::strategy::ResidualUpdate) -> Self {
                self.core.residual_update = update;
                self
            }
            pub fn with_monitor<F>(mut self, f: F) -> Self
            where
                F: FnMut(usize, T) + 'static,
            {
                self.core.history.monitor = Some(Box::new(f));
                self
            }
            /// Residual ratios of the last solve, starting with the initial guess.
            pub fn residual_history(&self) -> &[T] {
                &self.core.history.residuals
            }
        }
    };
}
pub(crate) use core_builders;

/// Standard PCG over an injected β rule.
pub struct PcgSolver<T> {
    pub core: PcgCore<T>,
    pub beta: BetaRule,
}

impl<T: Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self { core: PcgCore::new(tol, max_iters), beta: BetaRule::default() }
    }
    pub fn with_beta(mut self, rule: BetaRule) -> Self {
        self.beta = rule;
        self
    }
}

core_builders!(PcgSolver);

impl<M, T> LinearSolver<M, Vec<T>> for PcgSolver<T>
where
    M: MatVec<Vec<T>> + MatShape,
    (): InnerProduct<Vec<T>, Scalar = T>,
    T: Float + From<f64>,
{
    type Error = KError;
    type Scalar = T;

    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, Vec<T>>>,
        b: &Vec<T>,
        x: &mut Vec<T>,
        initial_guess_is_zero: bool,
    ) -> Result<SolveStats<T>, KError> {
        check_dimensions(a, b, x, initial_guess_is_zero)?;
        let mut dir = ConjugateUpdate { rule: self.beta.fresh_copy() };
        self.core.run(PCG_NAME, a, pc, b, x, initial_guess_is_zero, &mut dir)
    }
}
