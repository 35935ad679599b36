//! Dense faer operators and the `Vec` inner product as the solvers see them.

mod common;

use approx::assert_abs_diff_eq;
use common::{random_spd, system10};
use faer::Mat;
use pcgkit::core::{InnerProduct, MatShape, MatVec};

#[test]
fn shape_of_owned_and_borrowed_matrices() {
    let a = Mat::<f64>::from_fn(3, 7, |i, j| (i + j) as f64);
    assert_eq!(MatShape::nrows(&a), 3);
    assert_eq!(MatShape::ncols(&a), 7);
    let view = a.as_ref();
    assert_eq!(MatShape::nrows(&view), 3);
    assert_eq!(MatShape::ncols(&view), 7);
}

#[test]
fn borrowed_matvec_on_rectangular_matrix() {
    let a = Mat::<f64>::from_fn(3, 4, |i, j| (i as f64 + 1.0) * (j as f64 - 1.5));
    let x = vec![0.5, -1.0, 2.0, 0.25];
    let mut y = vec![f64::NAN; 3];
    a.as_ref().matvec(&x, &mut y);
    for i in 0..3 {
        let expected: f64 = (0..4).map(|j| a[(i, j)] * x[j]).sum();
        assert_abs_diff_eq!(y[i], expected, epsilon = 1e-13);
    }
}

#[test]
fn owned_and_borrowed_products_agree() {
    let (a, b, x_expected) = system10();
    let mut y_owned = vec![0.0; 10];
    let mut y_view = vec![0.0; 10];
    a.matvec(&x_expected, &mut y_owned);
    a.as_ref().matvec(&x_expected, &mut y_view);
    assert_eq!(y_owned, y_view);
    // the fixture's right-hand side is A·x for its integer solution
    for i in 0..10 {
        assert_abs_diff_eq!(y_owned[i], b[i], epsilon = 1e-12);
    }
}

#[test]
fn dot_and_norm_on_solver_sized_vectors() {
    let n = 50;
    let x: Vec<f64> = (0..n).map(|i| (0.37 * i as f64).sin()).collect();
    let y: Vec<f64> = (0..n).map(|i| 1.0 / (1.0 + i as f64)).collect();
    let expected: f64 = x.iter().zip(&y).map(|(u, v)| u * v).sum();
    assert_abs_diff_eq!(().dot(&x, &y), expected, epsilon = 1e-12);
    assert_abs_diff_eq!(().dot(&x, &y), ().dot(&y, &x), epsilon = 1e-12);
    let norm: f64 = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert_abs_diff_eq!(().norm(&x), norm, epsilon = 1e-12);
}

#[test]
fn spd_fixture_has_positive_energy() {
    let (a, b) = random_spd(20);
    let mut ab = vec![0.0; 20];
    a.matvec(&b, &mut ab);
    assert!(().dot(&b, &ab) > 0.0);
}
