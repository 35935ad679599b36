//! Solver-owned iteration vectors.

use num_traits::Float;

/// Residual, preconditioned residual, search direction and A·direction of one solve.
///
/// One workspace per solver instance, reset at every `solve` entry. A solver instance
/// runs one solve at a time.
#[derive(Debug, Clone)]
pub struct PcgWorkspace<T> {
    pub r: Vec<T>,
    pub z: Vec<T>,
    pub p: Vec<T>,
    pub ap: Vec<T>,
}

impl<T> Default for PcgWorkspace<T> {
    fn default() -> Self {
        Self { r: Vec::new(), z: Vec::new(), p: Vec::new(), ap: Vec::new() }
    }
}

impl<T: Float> PcgWorkspace<T> {
    /// Zero every vector at length `n`, reusing allocations.
    pub fn reset(&mut self, n: usize) {
        for v in [&mut self.r, &mut self.z, &mut self.p, &mut self.ap] {
            v.clear();
            v.resize(n, T::zero());
        }
    }
}
