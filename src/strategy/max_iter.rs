//! Iteration budget policies.

use super::FreshCopy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxIterations {
    Fixed(usize),
    /// ceil(fraction × order), at least one iteration.
    PercentageOfOrder(f64),
}

impl MaxIterations {
    pub fn resolve(&self, order: usize) -> usize {
        match *self {
            MaxIterations::Fixed(n) => n,
            MaxIterations::PercentageOfOrder(fraction) => {
                let n = (fraction * order as f64).ceil();
                if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
            }
        }
    }
}

impl Default for MaxIterations {
    fn default() -> Self {
        MaxIterations::PercentageOfOrder(1.0)
    }
}

impl FreshCopy for MaxIterations {
    fn fresh_copy(&self) -> Self {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_budgets() {
        assert_eq!(MaxIterations::Fixed(7).resolve(1000), 7);
        assert_eq!(MaxIterations::PercentageOfOrder(1.0).resolve(10), 10);
        assert_eq!(MaxIterations::PercentageOfOrder(0.25).resolve(10), 3);
        assert_eq!(MaxIterations::PercentageOfOrder(0.0).resolve(10), 1);
        assert_eq!(MaxIterations::PercentageOfOrder(f64::NAN).resolve(10), 1);
    }
}
