//! Reorthogonalized PCG.
//!
//! Every finished search direction d is kept together with its image Ad and its
//! curvature d·Ad. A new direction starts from z = M⁻¹r and has its component along
//! each cached direction removed,
//!
//! ```text
//! p = z - Σ_i (z·Ad_i / d_i·Ad_i) d_i
//! ```
//!
//! using only the cached images, so restoring A-conjugacy costs dot products rather
//! than operator applications. The projection against the newest entry is the usual
//! β-update, which is why no separate β rule is injected here.
//!
//! The cache outlives a single `solve`. When it is not cleared, the next solve first
//! projects its initial residual onto the cached directions (x += Σ (d_i·r / d_i·Ad_i) d_i)
//! and then keeps the new directions conjugate to the old ones, which reuses the Krylov
//! basis of a previous, nearby right-hand side.
//!
//! The cache assumes the operator does not change. After modifying the operator the
//! caller must [`ReorthoCache::clear`] it; this is not checked.

use std::collections::VecDeque;

use tracing::debug;

use crate::core::traits::{InnerProduct, MatShape, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::pcg::{DirectionUpdate, PcgCore, core_builders};
use crate::solver::{LinearSolver, check_dimensions};
use crate::utils::convergence::SolveStats;
use crate::utils::vecops::axpy;
use num_traits::Float;

pub(crate) const REORTHO_NAME: &str = "Reorthogonalized PCG";

/// One finished search direction.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDirection<T> {
    pub direction: Vec<T>,
    /// A · direction
    pub image: Vec<T>,
    /// direction · A · direction
    pub curvature: T,
}

/// Insertion-ordered (oldest first) store of search directions.
#[derive(Debug, Clone, Default)]
pub struct ReorthoCache<T> {
    entries: VecDeque<CachedDirection<T>>,
    capacity: Option<usize>,
}

impl<T> ReorthoCache<T> {
    pub fn new() -> Self {
        Self { entries: VecDeque::new(), capacity: None }
    }

    /// Keep at most `capacity` directions; storing more evicts the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity: Some(capacity) }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedDirection<T>> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CachedDirection<T>> {
        self.entries.get(index)
    }

    /// Append a finished direction with its image and curvature.
    pub fn store_direction_data(&mut self, direction: Vec<T>, image: Vec<T>, curvature: T) {
        if self.capacity == Some(0) {
            return;
        }
        if let Some(cap) = self.capacity {
            while self.entries.len() >= cap {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(CachedDirection { direction, image, curvature });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop the `n` oldest entries (all of them if `n` exceeds the length).
    pub fn remove_oldest(&mut self, n: usize) {
        let n = n.min(self.entries.len());
        self.entries.drain(..n);
    }

    /// Drop the `n` newest entries (all of them if `n` exceeds the length).
    pub fn remove_newest(&mut self, n: usize) {
        let keep = self.entries.len().saturating_sub(n);
        self.entries.truncate(keep);
    }
}

/// Projection of z against every cached direction.
struct Reorthogonalize<'a, T> {
    cache: &'a mut ReorthoCache<T>,
}

impl<T> Reorthogonalize<'_, T>
where
    (): InnerProduct<Vec<T>, Scalar = T>,
    T: Float + From<f64>,
{
    fn project(&self, z: &Vec<T>, p: &mut Vec<T>) {
        let ip = ();
        p.copy_from_slice(z);
        for entry in self.cache.iter() {
            let coef = ip.dot(z, &entry.image) / entry.curvature;
            axpy(-coef, &entry.direction, p);
        }
    }
}

impl<T> DirectionUpdate<T> for Reorthogonalize<'_, T>
where
    (): InnerProduct<Vec<T>, Scalar = T>,
    T: Float + From<f64>,
{
    fn warm_start(&mut self, x: &mut Vec<T>, r: &mut Vec<T>) {
        if self.cache.is_empty() {
            return;
        }
        let ip = ();
        for entry in self.cache.iter() {
            let coef = ip.dot(&entry.direction, r) / entry.curvature;
            axpy(coef, &entry.direction, x);
            axpy(-coef, &entry.image, r);
        }
        debug!(cached = self.cache.len(), "warm start from cached directions");
    }

    fn first(&mut self, z: &Vec<T>, p: &mut Vec<T>) {
        self.project(z, p);
    }

    fn next(&mut self, z: &Vec<T>, _rz_new: T, _rz_old: T, _cross: T, p: &mut Vec<T>) {
        self.project(z, p);
    }

    fn finalize(&mut self, p: &Vec<T>, ap: &Vec<T>, pap: T) {
        self.cache.store_direction_data(p.clone(), ap.clone(), pap);
    }
}

/// PCG with explicit reorthogonalization against a persistent direction cache.
pub struct ReorthoPcgSolver<T> {
    pub core: PcgCore<T>,
    pub cache: ReorthoCache<T>,
}

impl<T: Float> ReorthoPcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self { core: PcgCore::new(tol, max_iters), cache: ReorthoCache::new() }
    }

    /// Bound the cache to the `capacity` most recent directions.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = ReorthoCache::with_capacity(capacity);
        self
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn trim_oldest(&mut self, n: usize) {
        self.cache.remove_oldest(n);
    }

    pub fn trim_newest(&mut self, n: usize) {
        self.cache.remove_newest(n);
    }
}

core_builders!(ReorthoPcgSolver);

impl<M, T> LinearSolver<M, Vec<T>> for ReorthoPcgSolver<T>
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
        if self.cache.iter().any(|e| e.direction.len() != n) {
            return Err(KError::SolveError(format!(
                "reorthogonalization cache holds directions of another length than {n}; clear it first"
            )));
        }
        let mut dir = Reorthogonalize { cache: &mut self.cache };
        self.core.run(REORTHO_NAME, a, pc, b, x, initial_guess_is_zero, &mut dir)
    }
}
