//! Windowed stagnation detection on the residual ratio history.
//!
//! After every iteration the detector receives the current residual ratio ρ_k. Once
//! `span + 1` ratios are known it averages the relative reductions
//! (ρ_{j−1} − ρ_j) / ρ_{j−1} over the last `span` iterations and reports stagnation when
//! that average falls below the tolerance.
//!
//! Without an explicit tolerance, the first full window calibrates it once as
//! `CALIBRATION_FACTOR` times the first reduction in that window. A single outlier in
//! either the calibrating reduction or inside a later window skews the decision: a sharp
//! spike followed by healthy reductions still averages to a negative value and is
//! reported as stagnation.

use std::collections::VecDeque;

use super::FreshCopy;
use num_traits::Float;

pub const CALIBRATION_FACTOR: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct StagnationDetector<T> {
    span: usize,
    tolerance: Option<T>,
    calibrated: Option<T>,
    /// The last `span + 1` ratios
    history: VecDeque<T>,
}

impl<T: Float> StagnationDetector<T> {
    /// `span` is clamped to at least 1.
    pub fn new(span: usize, tolerance: Option<T>) -> Self {
        Self {
            span: span.max(1),
            tolerance,
            calibrated: None,
            history: VecDeque::with_capacity(span.max(1) + 1),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// The tolerance in effect: the configured one, or the calibrated one once known.
    pub fn tolerance(&self) -> Option<T> {
        self.tolerance.or(self.calibrated)
    }

    /// Record the ratio of the starting guess without testing for stagnation.
    pub fn initialize(&mut self, initial_ratio: T) {
        self.history.clear();
        self.calibrated = None;
        self.history.push_back(initial_ratio);
    }

    /// Record the ratio of a completed iteration and test the window ending at it.
    pub fn has_stagnated(&mut self, ratio: T) -> bool {
        self.history.push_back(ratio);
        if self.history.len() > self.span + 1 {
            self.history.pop_front();
        }
        if self.history.len() < self.span + 1 {
            return false;
        }
        let window = self.history.make_contiguous();
        let reduction = |j: usize| {
            let prev = window[j - 1];
            if prev > T::zero() { (prev - window[j]) / prev } else { T::zero() }
        };
        let tol = match self.tolerance {
            Some(tol) => tol,
            None => *self.calibrated.get_or_insert_with(|| {
                T::from(CALIBRATION_FACTOR).unwrap_or_else(T::epsilon) * reduction(1)
            }),
        };
        let span = T::from(self.span).unwrap_or_else(T::one);
        let average = (1..=self.span).fold(T::zero(), |acc, j| acc + reduction(j)) / span;
        average < tol
    }
}

impl<T: Float> FreshCopy for StagnationDetector<T> {
    fn fresh_copy(&self) -> Self {
        Self::new(self.span, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(det: &mut StagnationDetector<f64>, ratios: &[f64]) -> Vec<bool> {
        det.initialize(ratios[0]);
        ratios[1..].iter().map(|&r| det.has_stagnated(r)).collect()
    }

    #[test]
    fn steady_halving_never_stagnates() {
        let mut det = StagnationDetector::new(3, Some(0.1));
        let ratios: Vec<f64> = (0..10).map(|k| 0.5f64.powi(k)).collect();
        assert!(feed(&mut det, &ratios).iter().all(|s| !s));
    }

    #[test]
    fn flat_history_stagnates_after_full_window() {
        let mut det = StagnationDetector::new(3, Some(1e-3));
        let flags = feed(&mut det, &[1.0, 0.5, 0.5, 0.5, 0.5, 0.5]);
        assert_eq!(flags, vec![false, false, false, true, true]);
    }

    #[test]
    fn calibration_uses_first_reduction_of_first_window() {
        let mut det = StagnationDetector::new(2, None);
        det.initialize(1.0);
        assert!(!det.has_stagnated(0.5));
        assert_eq!(det.tolerance(), None);
        assert!(!det.has_stagnated(0.25));
        let tol = det.tolerance().unwrap();
        assert!((tol - 0.5 * CALIBRATION_FACTOR).abs() < 1e-15);
        // Later windows keep the first calibration.
        det.has_stagnated(0.2499);
        assert_eq!(det.tolerance(), Some(tol));
    }

    #[test]
    fn outlier_spike_is_reported_as_stagnation() {
        // A 100x spike followed by two halvings averages to a negative reduction.
        let mut det = StagnationDetector::new(3, Some(1e-3));
        let flags = feed(&mut det, &[1.0, 0.5, 0.25, 25.0, 12.5, 6.25]);
        assert_eq!(flags.last(), Some(&true));
    }

    #[test]
    fn outlier_in_calibration_masks_later_plateau() {
        // The calibrating reduction is a spike, so the tolerance becomes negative and the
        // plateau that follows is not flagged.
        let mut det = StagnationDetector::new(2, None);
        let flags = feed(&mut det, &[1.0, 10.0, 9.0, 9.0, 9.0, 9.0]);
        assert!(det.tolerance().unwrap() < 0.0);
        assert!(flags[2..].iter().all(|s| !s));
    }

    #[test]
    fn window_keeps_only_last_span_ratios() {
        let mut det = StagnationDetector::new(2, Some(0.1));
        let ratios: Vec<f64> = (0..50).map(|k| 0.5f64.powi(k)).collect();
        assert!(feed(&mut det, &ratios).iter().all(|s| !s));
        assert_eq!(det.history.len(), 3);
        assert_eq!(det.history.back(), Some(&0.5f64.powi(49)));
    }

    #[test]
    fn fresh_copy_forgets_history() {
        let mut det = StagnationDetector::new(2, None);
        feed(&mut det, &[1.0, 0.5, 0.25]);
        assert!(det.tolerance().is_some());
        let fresh = det.fresh_copy();
        assert_eq!(fresh.tolerance(), None);
        assert_eq!(fresh.span(), 2);
    }
}
