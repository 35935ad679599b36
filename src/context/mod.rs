//! Context module for pcgkit.
//!
//! Provides [`KspContext`], which owns an operator, an optional preconditioner and a
//! solver built from [`SolverOptions`](crate::config::SolverOptions).
//!
//! # Example
//! ```rust,ignore
//! let opts = SolverOptions { kind: SolverKind::ReorthoPcg, ..Default::default() };
//! let mut ksp = KspContext::new(a, Some(Box::new(Jacobi::new())), &opts)?;
//! let stats = ksp.solve_context(&b, &mut x, true)?;
//! ```

pub mod ksp_context;
pub use ksp_context::{KspContext, KspSolver};
