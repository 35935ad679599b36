//! Residual update policies.

use super::FreshCopy;
use crate::core::traits::MatVec;
use crate::utils::vecops::{axpy, exact_residual};
use num_traits::Float;

/// How r is advanced after x ← x + αp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualUpdate {
    /// r ← r − α·Ap
    #[default]
    Recurrence,
    /// Recurrence, replaced by the exact r = b − A·x every `period` iterations
    /// to flush accumulated floating-point drift.
    Periodic { period: usize },
}

impl ResidualUpdate {
    /// True when the residual after `iteration` completed iterations is recomputed exactly.
    pub fn is_exact_due(&self, iteration: usize) -> bool {
        match *self {
            ResidualUpdate::Recurrence => false,
            ResidualUpdate::Periodic { period } => period > 0 && iteration % period == 0,
        }
    }

    /// True when a multiple of the period falls in `(from, to]`; used by drivers that
    /// advance several iterations at once.
    pub fn is_exact_due_within(&self, from: usize, to: usize) -> bool {
        match *self {
            ResidualUpdate::Recurrence => false,
            ResidualUpdate::Periodic { period } => period > 0 && to / period > from / period,
        }
    }

    /// Advance `r` for the `iteration`-th completed step.
    pub(crate) fn update<M, T>(
        &self,
        iteration: usize,
        a: &M,
        b: &Vec<T>,
        x: &Vec<T>,
        ap: &Vec<T>,
        alpha: T,
        r: &mut Vec<T>,
    ) where
        M: MatVec<Vec<T>> + ?Sized,
        T: Float,
    {
        if self.is_exact_due(iteration) {
            exact_residual(a, b, x, r);
        } else {
            axpy(-alpha, ap, r);
        }
    }
}

impl FreshCopy for ResidualUpdate {
    fn fresh_copy(&self) -> Self {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_schedule() {
        let upd = ResidualUpdate::Periodic { period: 5 };
        assert!(!upd.is_exact_due(4));
        assert!(upd.is_exact_due(5));
        assert!(upd.is_exact_due(10));
        assert!(upd.is_exact_due_within(3, 6));
        assert!(!upd.is_exact_due_within(5, 9));
        assert!(!ResidualUpdate::Recurrence.is_exact_due(5));
        assert!(!ResidualUpdate::Periodic { period: 0 }.is_exact_due_within(0, 100));
    }
}
