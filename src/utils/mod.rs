//! Convergence bookkeeping and vector kernels.

pub mod convergence;
pub mod vecops;
