//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use faer::Mat;
use rand::Rng;

/// A 10×10 symmetric positive definite system with a known integer solution.
///
/// Returns `(A, b, x_expected)`.
pub fn system10() -> (Mat<f64>, Vec<f64>, Vec<f64>) {
    let rows: [[f64; 10]; 10] = [
        [10.0, -1.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        [-1.0, 11.0, -1.0, 3.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        [2.0, -1.0, 10.0, -1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0],
        [0.0, 3.0, -1.0, 8.0, -1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, -1.0, 9.0, 2.0, 0.0, 0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0, 0.0, 2.0, 12.0, -3.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 2.0, 0.0, 0.0, -3.0, 10.0, 1.0, 0.0, 2.0],
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 7.0, -2.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -2.0, 9.0, 1.0],
        [0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 2.0, 0.0, 1.0, 6.0],
    ];
    let a = Mat::from_fn(10, 10, |i, j| rows[i][j]);
    let b = vec![12.0, -29.0, 52.0, -54.0, 47.0, -82.0, 66.0, -71.0, 85.0, -42.0];
    let x = vec![1.0, -2.0, 3.0, -4.0, 5.0, -6.0, 7.0, -8.0, 9.0, -10.0];
    (a, b, x)
}

/// 1-D Laplacian stencil [-1, 2, -1].
pub fn laplacian(n: usize) -> Mat<f64> {
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

/// Random SPD matrix `Mᵀ M + I` and a random right-hand side.
pub fn random_spd(n: usize) -> (Mat<f64>, Vec<f64>) {
    let mut rng = rand::thread_rng();
    let data: Vec<f64> = (0..n * n).map(|_| rng.r#gen()).collect();
    let m = Mat::from_fn(n, n, |i, j| data[j * n + i]);
    let m_t = m.transpose();
    let a = &m_t * &m + Mat::<f64>::identity(n, n);
    let b: Vec<f64> = (0..n).map(|_| rng.r#gen()).collect();
    (a, b)
}

/// Dense LU reference solution.
pub fn direct_solve(a: &Mat<f64>, b: &[f64]) -> Vec<f64> {
    use faer::linalg::solvers::SolveCore;
    let n = b.len();
    let mut x = b.to_vec();
    let lu = faer::linalg::solvers::FullPivLu::new(a.as_ref());
    let x_mat = faer::MatMut::from_column_major_slice_mut(&mut x, n, 1);
    lu.solve_in_place_with_conj(faer::Conj::No, x_mat);
    x
}

pub fn residual_norm(a: &Mat<f64>, b: &[f64], x: &[f64]) -> f64 {
    let n = b.len();
    (0..n)
        .map(|i| {
            let ax: f64 = (0..n).map(|j| a[(i, j)] * x[j]).sum();
            (b[i] - ax).powi(2)
        })
        .sum::<f64>()
        .sqrt()
}
