//! Block (s-step) PCG.
//!
//! The recurrence advances `s` iterations per block. At each block start the Krylov
//! kernels of the current residual and direction are generated and all inner products
//! the block needs are tabulated at once (see [`block_kernel`](super::block_kernel)).
//! The `s` sub-steps then run on small coefficient vectors; full-length x, r and the
//! direction are materialized once per block.
//!
//! Directions are carried unpreconditioned: the search direction of a sub-step is
//! p = M·q with q = r + βq. The solution update is therefore accumulated as
//! Σ α_j q_j and becomes Σ α_j p_j only after the single preconditioner application at
//! the block boundary. The accumulated coefficients are not a valid correction before
//! that.
//!
//! Convergence is tested on the materialized residual at block boundaries, so block
//! size 1 follows the standard PCG trace. A block ends early when the preconditioned
//! residual estimate δ = r·M·r already meets the tolerance relative to the first δ, or
//! when δ is no longer positive.

use tracing::{debug, trace, warn};

use crate::core::traits::{InnerProduct, MatShape, MatVec};
use crate::error::KError;
use crate::preconditioner::{Preconditioner, precondition};
use crate::solver::block_kernel::{BlockKernel, KernelCombination};
use crate::solver::pcg::{PcgCore, core_builders, lossy};
use crate::solver::{LinearSolver, check_dimensions};
use crate::strategy::{BetaRule, FreshCopy};
use crate::utils::convergence::{SolveStats, Status};
use crate::utils::vecops::{axpy, exact_residual};
use num_traits::Float;

pub(crate) const BLOCK_NAME: &str = "Block PCG";

pub struct BlockPcgSolver<T> {
    pub core: PcgCore<T>,
    pub beta: BetaRule,
    block_size: usize,
    kernel: BlockKernel<T>,
}

impl<T: Float> BlockPcgSolver<T> {
    /// A `block_size` of 0 is rejected at `solve`.
    pub fn new(block_size: usize, tol: T, max_iters: usize) -> Self {
        Self {
            core: PcgCore::new(tol, max_iters),
            beta: BetaRule::default(),
            block_size,
            kernel: BlockKernel::new(block_size),
        }
    }

    pub fn with_beta(mut self, rule: BetaRule) -> Self {
        self.beta = rule;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

core_builders!(BlockPcgSolver);

impl<M, T> LinearSolver<M, Vec<T>> for BlockPcgSolver<T>
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
        let n = check_dimensions(a, b, x, initial_guess_is_zero)?;
        let s = self.block_size;
        if s == 0 {
            return Err(KError::InvalidBlockSize(s));
        }
        let BlockPcgSolver { core, beta, kernel, .. } = self;
        let PcgCore { conv, residual_update, history, ws } = core;
        let beta_rule = beta.fresh_copy();
        let residual_update = residual_update.fresh_copy();
        let ip = ();
        ws.reset(n);
        kernel.reset(n);
        history.residuals.clear();

        // ws.p holds the unpreconditioned direction q, ws.ap and ws.z are scratch.
        if initial_guess_is_zero {
            ws.r.copy_from_slice(b);
        } else {
            exact_residual(a, b, x, &mut ws.r);
        }
        ws.p.copy_from_slice(&ws.r);
        let res0 = ip.norm(&ws.r);
        let mut mon = conv.start(ip.norm(b), res0, n);
        let mut ratio = mon.ratio(res0);
        history.record(0, ratio);
        debug!(solver = BLOCK_NAME, n, block_size = s, ratio = lossy(ratio), "solve started");
        if mon.check_initial(ratio) == Status::Converged {
            return Ok(mon.stats(BLOCK_NAME, 0, ratio, Status::Converged));
        }

        let max_iters = mon.max_iters();
        let mut iterations = 0;
        let mut first_delta: Option<T> = None;
        while iterations < max_iters {
            kernel.build(a, pc, &ws.r, &ws.p)?;
            let mut rc = KernelCombination::residual_seed(s);
            let mut qc = KernelCombination::direction_seed(s);
            let mut xc = KernelCombination::zeros(s);
            let mut delta = kernel.sandwich(&rc, &rc);
            let delta_ref = *first_delta.get_or_insert(delta);

            let steps = s.min(max_iters - iterations);
            let mut done = 0;
            let mut breakdown = false;
            for _ in 0..steps {
                let kq = qc.shifted();
                let pap = kernel.sandwich(&qc, &kq);
                if !(pap > T::zero()) {
                    // Past the first sub-step p·Ap is extrapolated from the tables and may
                    // lose its sign to rounding; only a fresh block's value is trusted.
                    if done == 0 {
                        warn!(solver = BLOCK_NAME, iteration = iterations, p_ap = lossy(pap), "p·Ap <= 0, stopping");
                        breakdown = true;
                    } else {
                        debug!(solver = BLOCK_NAME, iteration = iterations + done, p_ap = lossy(pap), "extrapolated p·Ap <= 0, restarting block");
                    }
                    break;
                }
                let alpha = delta / pap;
                xc.axpy(alpha, &qc);
                let mut rc_new = rc.clone();
                rc_new.axpy(-alpha, &kq);
                let delta_new = kernel.sandwich(&rc_new, &rc_new);
                let cross = if beta_rule.needs_cross_term() {
                    kernel.sandwich(&rc_new, &rc)
                } else {
                    T::zero()
                };
                qc.xpby(&rc_new, beta_rule.beta(delta_new, delta, cross));
                rc = rc_new;
                delta = delta_new;
                done += 1;
                trace!(solver = BLOCK_NAME, iteration = iterations + done, delta = lossy(delta), alpha = lossy(alpha));

                let estimate_met = mon
                    .tolerance()
                    .is_some_and(|tol| (delta / delta_ref).abs().sqrt() <= tol);
                if !(delta > T::zero()) || estimate_met {
                    break;
                }
            }

            if done > 0 {
                // x += M·(Σ α_j q_j)
                kernel.evaluate(&xc, &mut ws.ap);
                precondition(pc, &ws.ap, &mut ws.z)?;
                axpy(T::one(), &ws.z, x);

                let before = iterations;
                iterations += done;
                if residual_update.is_exact_due_within(before, iterations) {
                    exact_residual(a, b, x, &mut ws.r);
                } else {
                    kernel.evaluate(&rc, &mut ws.r);
                }
                kernel.evaluate(&qc, &mut ws.p);
                ratio = mon.ratio(ip.norm(&ws.r));
                history.record(iterations, ratio);
                debug!(solver = BLOCK_NAME, iterations, substeps = done, ratio = lossy(ratio), "block finished");
            }

            let status = if breakdown { Status::Stagnated } else { mon.check(ratio) };
            if status != Status::Running {
                debug!(solver = BLOCK_NAME, iterations, ?status, "solve finished");
                return Ok(mon.stats(BLOCK_NAME, iterations, ratio, status));
            }
        }
        debug!(solver = BLOCK_NAME, iterations, ratio = lossy(ratio), "iteration budget exhausted");
        Ok(mon.stats(BLOCK_NAME, iterations, ratio, Status::Running))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    fn laplacian(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| {
            if i == j {
                2.0
            } else if i.abs_diff(j) == 1 {
                -1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let a = laplacian(4);
        let mut x = vec![0.0; 4];
        let err = BlockPcgSolver::new(0, 1e-8, 10)
            .solve(&a, None, &vec![1.0; 4], &mut x, true)
            .unwrap_err();
        assert_eq!(err, KError::InvalidBlockSize(0));
    }

    #[test]
    fn block_of_two_solves_small_laplacian() {
        let a = laplacian(6);
        let b = vec![1.0; 6];
        let mut x = vec![0.0; 6];
        let mut solver = BlockPcgSolver::new(2, 1e-8, 50);
        let stats = solver.solve(&a, None, &b, &mut x, true).unwrap();
        assert!(stats.converged, "{stats:?}");
        assert_eq!(stats.algorithm, "Block PCG");
        let mut ax = vec![0.0; 6];
        a.matvec(&x, &mut ax);
        for (u, v) in ax.iter().zip(&b) {
            assert!((u - v).abs() < 1e-6);
        }
    }

    #[test]
    fn budget_counts_substeps() {
        let a = laplacian(20);
        let mut x = vec![0.0; 20];
        let stats = BlockPcgSolver::new(3, 1e-14, 7)
            .with_criterion(crate::strategy::ConvergenceCriterion::Never)
            .solve(&a, None, &vec![1.0; 20], &mut x, true)
            .unwrap();
        assert!(!stats.converged);
        assert_eq!(stats.iterations, 7);
    }
}
