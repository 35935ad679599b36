//! Conjugacy parameter (β) rules.

use super::FreshCopy;
use num_traits::Float;

/// How β is formed from the current and the immediately prior δ = r·z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BetaRule {
    /// β = δ_new / δ_old
    #[default]
    FletcherReeves,
    /// β = max(0, (δ_new − r_new·z_old) / δ_old)
    PolakRibiere,
}

impl BetaRule {
    /// Whether the rule needs r_new·z_old from the solver.
    pub fn needs_cross_term(&self) -> bool {
        matches!(self, BetaRule::PolakRibiere)
    }

    /// `cross` is r_new·z_old; ignored by Fletcher–Reeves.
    pub fn beta<T: Float>(&self, rz_new: T, rz_old: T, cross: T) -> T {
        match self {
            BetaRule::FletcherReeves => rz_new / rz_old,
            BetaRule::PolakRibiere => ((rz_new - cross) / rz_old).max(T::zero()),
        }
    }
}

impl FreshCopy for BetaRule {
    fn fresh_copy(&self) -> Self {
        *self
    }
}
