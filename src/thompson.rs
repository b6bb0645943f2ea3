//! Beta posteriors and Thompson draws.
//!
//! Each variant's click-through rate is modelled as `Beta(alpha, beta)` with
//! the conjugate update `alpha = alpha_prior + clicks`,
//! `beta = beta_prior + (impressions - clicks)`.
//!
//! Notes:
//! - Sampling takes the random source as an argument; nothing here owns an RNG.
//! - Iteration follows variant name order, so a seeded RNG reproduces draws exactly.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use std::collections::BTreeMap;

use crate::{Allocation, AllocationConfig, VariantObservation};

/// Beta posterior for one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    /// Conjugate update of the configured prior with observed clicks/failures.
    pub fn from_observation(obs: &VariantObservation, cfg: &AllocationConfig) -> Self {
        Self {
            alpha: cfg.alpha_prior + obs.clicks as f64,
            beta: cfg.beta_prior + obs.failures() as f64,
        }
    }

    /// Posterior mean `alpha / (alpha + beta)`.
    pub fn expected_value(&self) -> f64 {
        let denom = self.alpha + self.beta;
        if denom <= 0.0 || !denom.is_finite() {
            0.5
        } else {
            self.alpha / denom
        }
    }

    /// Draw one `theta ~ Beta(alpha, beta)`.
    ///
    /// Invalid parameters fall back to the posterior mean rather than panicking.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if !(self.alpha.is_finite() && self.beta.is_finite()) || self.alpha <= 0.0 || self.beta <= 0.0
        {
            return self.expected_value();
        }
        match Beta::new(self.alpha, self.beta) {
            Ok(dist) => dist.sample(rng),
            Err(_) => self.expected_value(),
        }
    }
}

/// Posteriors for every variant, keyed by name.
pub fn posteriors(
    variants: &[VariantObservation],
    cfg: &AllocationConfig,
) -> BTreeMap<String, BetaPosterior> {
    variants
        .iter()
        .map(|v| (v.name.clone(), BetaPosterior::from_observation(v, cfg)))
        .collect()
}

/// One Thompson draw per variant, in name order.
pub fn sample_thetas<R: Rng + ?Sized>(
    posteriors: &BTreeMap<String, BetaPosterior>,
    rng: &mut R,
) -> BTreeMap<String, f64> {
    posteriors
        .iter()
        .map(|(name, p)| (name.clone(), p.sample(rng)))
        .collect()
}

/// Turn sampled thetas into a probability simplex: `theta_i / sum(theta)`.
///
/// Returns `None` when the sum is not positive and finite.
pub fn raw_allocation(thetas: &BTreeMap<String, f64>) -> Option<Allocation> {
    let total: f64 = thetas.values().sum();
    if thetas.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some(thetas.iter().map(|(k, &t)| (k.clone(), t / total)).collect())
}
