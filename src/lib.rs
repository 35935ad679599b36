//! pcgkit: preconditioned conjugate-gradient solvers
//!
//! This crate provides the conjugate-direction family for symmetric positive definite
//! systems A·x = b: the standard PCG recurrence with pluggable termination and update
//! strategies, a reorthogonalized variant that keeps (and can reuse across solves) its
//! search directions, and an s-step block variant that advances several iterations per
//! round of inner products.

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod preconditioner;
pub mod solver;
pub mod strategy;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use self::core::*;
pub use error::*;
pub use preconditioner::*;
pub use solver::*;
pub use strategy::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::{Convergence, SolveStats};
