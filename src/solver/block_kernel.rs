//! Krylov kernels and sandwich tables of one s-step block.
//!
//! With K = A·M, a block starting from residual r and (unpreconditioned) direction q
//! builds
//!
//! ```text
//! R_i = K^i r,  i = 0..s-1        (residual kernels)
//! Q_i = K^i q,  i = 0..s          (direction kernels)
//! ```
//!
//! Because M·K^k is symmetric for symmetric A and M, every preconditioned inner
//! product between kernel vectors depends only on the total power:
//!
//! ```text
//! R_i·M·R_j = rr[i+j]   (2s-1 entries)
//! Q_i·M·Q_j = qq[i+j]   (2s+1 entries)
//! R_i·M·Q_j = rq[i+j]   (2s entries)
//! ```
//!
//! Inside a block, vectors are tracked as coefficients over the kernels
//! ([`KernelCombination`]) and only materialized at the block boundary.

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::KError;
use crate::preconditioner::{Preconditioner, precondition};
use crate::utils::vecops::axpy;
use num_traits::Float;

/// Coefficients of a vector over the residual and direction kernels of a block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KernelCombination<T> {
    pub residual: Vec<T>,
    pub direction: Vec<T>,
}

impl<T: Float> KernelCombination<T> {
    pub fn zeros(block_size: usize) -> Self {
        Self {
            residual: vec![T::zero(); block_size],
            direction: vec![T::zero(); block_size + 1],
        }
    }

    /// The block's starting residual, R_0.
    pub fn residual_seed(block_size: usize) -> Self {
        let mut c = Self::zeros(block_size);
        c.residual[0] = T::one();
        c
    }

    /// The block's starting direction, Q_0.
    pub fn direction_seed(block_size: usize) -> Self {
        let mut c = Self::zeros(block_size);
        c.direction[0] = T::one();
        c
    }

    /// Coefficients of K·v: every power moves up by one.
    pub fn shifted(&self) -> Self {
        debug_assert!(self.residual.last().is_none_or(|c| *c == T::zero()));
        debug_assert!(self.direction.last().is_none_or(|c| *c == T::zero()));
        let shift = |v: &[T]| {
            let mut out = vec![T::zero(); v.len()];
            out[1..].copy_from_slice(&v[..v.len() - 1]);
            out
        };
        Self {
            residual: shift(&self.residual),
            direction: shift(&self.direction),
        }
    }

    /// self ← self + α other
    pub fn axpy(&mut self, alpha: T, other: &Self) {
        axpy(alpha, &other.residual, &mut self.residual);
        axpy(alpha, &other.direction, &mut self.direction);
    }

    /// self ← other + β self
    pub fn xpby(&mut self, other: &Self, beta: T) {
        crate::utils::vecops::xpby(&other.residual, beta, &mut self.residual);
        crate::utils::vecops::xpby(&other.direction, beta, &mut self.direction);
    }
}

/// Kernel vectors, their preconditioned images and the sandwich tables of a block.
///
/// Array lengths are fixed by the block size at construction.
#[derive(Debug, Clone)]
pub(crate) struct BlockKernel<T> {
    block_size: usize,
    residual: Vec<Vec<T>>,
    residual_pc: Vec<Vec<T>>,
    direction: Vec<Vec<T>>,
    direction_pc: Vec<Vec<T>>,
    rr: Vec<T>,
    qq: Vec<T>,
    rq: Vec<T>,
}

impl<T: Float> BlockKernel<T> {
    pub fn new(block_size: usize) -> Self {
        let s = block_size;
        Self {
            block_size: s,
            residual: vec![Vec::new(); s],
            residual_pc: vec![Vec::new(); s],
            direction: vec![Vec::new(); s + 1],
            direction_pc: vec![Vec::new(); s + 1],
            rr: vec![T::zero(); (2 * s).saturating_sub(1)],
            qq: vec![T::zero(); 2 * s + 1],
            rq: vec![T::zero(); 2 * s],
        }
    }

    /// Zero every kernel vector at length `n` and every table entry.
    pub fn reset(&mut self, n: usize) {
        let vectors = self
            .residual
            .iter_mut()
            .chain(self.residual_pc.iter_mut())
            .chain(self.direction.iter_mut())
            .chain(self.direction_pc.iter_mut());
        for v in vectors {
            v.clear();
            v.resize(n, T::zero());
        }
        for t in self.rr.iter_mut().chain(self.qq.iter_mut()).chain(self.rq.iter_mut()) {
            *t = T::zero();
        }
    }

    /// Generate the kernels from `r` and `q` and tabulate the sandwich products.
    pub fn build<M>(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, Vec<T>>>,
        r: &[T],
        q: &[T],
    ) -> Result<(), KError>
    where
        M: MatVec<Vec<T>>,
        (): InnerProduct<Vec<T>, Scalar = T>,
    {
        let s = self.block_size;
        self.residual[0].copy_from_slice(r);
        for i in 0..s {
            precondition(pc, &self.residual[i], &mut self.residual_pc[i])?;
            if i + 1 < s {
                a.matvec(&self.residual_pc[i], &mut self.residual[i + 1]);
            }
        }
        self.direction[0].copy_from_slice(q);
        for i in 0..=s {
            precondition(pc, &self.direction[i], &mut self.direction_pc[i])?;
            if i < s {
                a.matvec(&self.direction_pc[i], &mut self.direction[i + 1]);
            }
        }

        let ip = ();
        for (k, t) in self.rr.iter_mut().enumerate() {
            let i = k.min(s - 1);
            *t = ip.dot(&self.residual[i], &self.residual_pc[k - i]);
        }
        for (k, t) in self.qq.iter_mut().enumerate() {
            let i = k.min(s);
            *t = ip.dot(&self.direction[i], &self.direction_pc[k - i]);
        }
        for (k, t) in self.rq.iter_mut().enumerate() {
            let i = k.min(s - 1);
            *t = ip.dot(&self.residual[i], &self.direction_pc[k - i]);
        }
        Ok(())
    }

    /// u·M·v for two combinations over the current kernels.
    pub fn sandwich(&self, u: &KernelCombination<T>, v: &KernelCombination<T>) -> T {
        let mut acc = T::zero();
        for (i, &ui) in u.residual.iter().enumerate().filter(|(_, c)| **c != T::zero()) {
            for (j, &vj) in v.residual.iter().enumerate() {
                acc = acc + ui * vj * self.rr[i + j];
            }
            for (j, &vj) in v.direction.iter().enumerate() {
                acc = acc + ui * vj * self.rq[i + j];
            }
        }
        for (i, &ui) in u.direction.iter().enumerate().filter(|(_, c)| **c != T::zero()) {
            for (j, &vj) in v.residual.iter().enumerate() {
                acc = acc + ui * vj * self.rq[j + i];
            }
            for (j, &vj) in v.direction.iter().enumerate() {
                acc = acc + ui * vj * self.qq[i + j];
            }
        }
        acc
    }

    /// out = Σ c_i R_i + Σ d_i Q_i
    pub fn evaluate(&self, c: &KernelCombination<T>, out: &mut [T]) {
        out.iter_mut().for_each(|o| *o = T::zero());
        let terms = c
            .residual
            .iter()
            .zip(&self.residual)
            .chain(c.direction.iter().zip(&self.direction));
        for (&coef, v) in terms {
            if coef != T::zero() {
                axpy(coef, v, out);
            }
        }
    }
}
