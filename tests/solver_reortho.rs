//! Integration tests for reorthogonalized PCG and its persistent direction cache.

mod common;

use approx::assert_abs_diff_eq;
use common::{laplacian, residual_norm, system10};
use faer::Mat;
use pcgkit::error::KError;
use pcgkit::preconditioner::{Jacobi, Preconditioner};
use pcgkit::solver::{LinearSolver, PcgSolver, ReorthoPcgSolver};

#[test]
fn empty_cache_follows_pcg() {
    let a = laplacian(10);
    let b: Vec<f64> = (0..10).map(|i| (i as f64 + 1.0).sin()).collect();
    let mut x_pcg = vec![0.0; 10];
    let mut x_re = vec![0.0; 10];
    let pcg = PcgSolver::new(1e-10, 100).solve(&a, None, &b, &mut x_pcg, true).unwrap();
    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    let re = solver.solve(&a, None, &b, &mut x_re, true).unwrap();
    assert!(pcg.converged && re.converged);
    assert_eq!(re.algorithm, "Reorthogonalized PCG");
    assert_eq!(re.iterations, pcg.iterations);
    for i in 0..10 {
        assert_abs_diff_eq!(x_re[i], x_pcg[i], epsilon = 1e-8);
    }
    assert_eq!(solver.cache.len(), re.iterations);
}

#[test]
fn cached_directions_are_conjugate() {
    let (a, b, _) = system10();
    let mut x = vec![0.0; 10];
    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    solver.solve(&a, None, &b, &mut x, true).unwrap();
    let entries: Vec<_> = solver.cache.iter().collect();
    for (i, di) in entries.iter().enumerate() {
        for dj in &entries[i + 1..] {
            let coupling: f64 = di.direction.iter().zip(&dj.image).map(|(u, v)| u * v).sum();
            assert!(coupling.abs() <= 1e-8 * di.curvature.max(dj.curvature), "{coupling}");
        }
        assert!(di.curvature > 0.0);
    }
}

#[test]
fn full_cache_solves_next_rhs_by_projection() {
    let (a, b, _) = system10();
    let mut pc = Jacobi::new();
    <Jacobi<f64> as Preconditioner<Mat<f64>, Vec<f64>>>::setup(&mut pc, &a).unwrap();
    let mut solver = ReorthoPcgSolver::new(1e-8, 100);
    let mut x = vec![0.0; 10];
    let first = solver.solve(&a, Some(&pc), &b, &mut x, true).unwrap();
    assert!(first.converged);

    // Ten conjugate directions span the whole space.
    assert_eq!(solver.cache.len(), 10);
    let b2: Vec<f64> = (0..10).map(|i| 1.0 + i as f64).collect();
    let mut x2 = vec![0.0; 10];
    let second = solver.solve(&a, Some(&pc), &b2, &mut x2, true).unwrap();
    assert!(second.converged);
    assert_eq!(second.iterations, 0);
    assert!(residual_norm(&a, &b2, &x2) <= 1e-6);
}

#[test]
fn warm_cache_never_needs_more_iterations() {
    let a = laplacian(10);
    let b1 = vec![1.0; 10];
    let mut b2 = b1.clone();
    b2[0] += 0.5;
    b2[7] -= 0.25;

    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    let mut x1 = vec![0.0; 10];
    let first = solver.solve(&a, None, &b1, &mut x1, true).unwrap();
    let mut x2 = vec![0.0; 10];
    let second = solver.solve(&a, None, &b2, &mut x2, true).unwrap();
    assert!(first.converged && second.converged);
    assert!(second.iterations <= first.iterations, "{} > {}", second.iterations, first.iterations);
    assert!(residual_norm(&a, &b2, &x2) <= 1e-8);
}

#[test]
fn clearing_restores_cold_behavior() {
    let a = laplacian(12);
    let b = vec![1.0; 12];
    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    let mut x = vec![0.0; 12];
    let cold = solver.solve(&a, None, &b, &mut x, true).unwrap();
    solver.clear();
    assert!(solver.cache.is_empty());
    let again = solver.solve(&a, None, &b, &mut x, true).unwrap();
    assert_eq!(again.iterations, cold.iterations);
}

#[test]
fn trimming_beyond_length_empties_the_cache() {
    let a = laplacian(8);
    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    let mut x = vec![0.0; 8];
    solver.solve(&a, None, &vec![1.0; 8], &mut x, true).unwrap();
    let n = solver.cache.len();
    assert!(n > 1);
    solver.trim_newest(1);
    assert_eq!(solver.cache.len(), n - 1);
    solver.trim_oldest(n + 5);
    assert!(solver.cache.is_empty());
}

#[test]
fn bounded_cache_still_converges() {
    let (a, b, x_expected) = system10();
    let mut solver = ReorthoPcgSolver::new(1e-9, 100).with_cache_capacity(3);
    let mut x = vec![0.0; 10];
    let stats = solver.solve(&a, None, &b, &mut x, true).unwrap();
    assert!(stats.converged);
    assert!(solver.cache.len() <= 3);
    assert_eq!(solver.cache.capacity(), Some(3));
    for i in 0..10 {
        assert_abs_diff_eq!(x[i], x_expected[i], epsilon = 1e-6);
    }
}

#[test]
fn cache_from_another_order_is_rejected() {
    let mut solver = ReorthoPcgSolver::new(1e-10, 100);
    let mut x = vec![0.0; 4];
    solver.solve(&laplacian(4), None, &vec![1.0; 4], &mut x, true).unwrap();
    let err = solver
        .solve(&laplacian(6), None, &vec![1.0; 6], &mut x, true)
        .unwrap_err();
    assert!(matches!(err, KError::SolveError(_)));

    solver.clear();
    let stats = solver.solve(&laplacian(6), None, &vec![1.0; 6], &mut x, true).unwrap();
    assert!(stats.converged);
}
