//! The allocation engine: observations in, bounded traffic split out.
//!
//! Pipeline (each stage is a pure `Allocation -> Allocation` function):
//!
//! ```text
//!   warmup? ── yes ──> uniform
//!      │ no
//!   posteriors -> thetas -> raw -> exploration floor -> control floor
//!              -> daily-shift cap -> normalize + round
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::error::{InputError, Result};
use crate::{
    apply_control_floor, apply_daily_shift_cap, apply_exploration_floor, normalize_rounded,
    posteriors, raw_allocation, sample_thetas, total_impressions, validate_observations,
    Allocation, AllocationConfig, AllocationMode, AllocationNote, BetaPosterior,
    VariantObservation,
};

/// Algorithm identifier recorded in every report.
pub const ALGORITHM: &str = "thompson_sampling";

/// Per-variant row of an [`AllocationReport`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantReport {
    pub name: String,
    pub allocation: f64,
    pub ctr: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Posterior parameters (optimizing mode only).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub posterior: Option<BetaPosterior>,
    /// Thompson draw for this call (optimizing mode only).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub sample: Option<f64>,
}

/// Full output of one computation: the allocation plus everything needed to
/// display or audit it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationReport {
    pub allocation: Allocation,
    pub mode: AllocationMode,
    pub algorithm: String,
    /// The configuration the allocation was computed with.
    pub parameters: AllocationConfig,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    /// One row per input variant, in input order.
    pub variants: Vec<VariantReport>,
    pub notes: Vec<AllocationNote>,
}

/// Thompson-sampling allocation engine for a single experiment.
///
/// The engine owns its random source and a validated config; it holds no other
/// state between calls. [`AllocationEngine::new`] seeds from the OS so that
/// successive calls draw fresh samples; use [`with_seed`](AllocationEngine::with_seed)
/// or [`with_rng`](AllocationEngine::with_rng) for reproducible runs.
#[derive(Debug, Clone)]
pub struct AllocationEngine<R = StdRng> {
    cfg: AllocationConfig,
    rng: R,
}

impl AllocationEngine<StdRng> {
    /// Validate `cfg` and create an engine with an OS-seeded RNG.
    pub fn new(cfg: AllocationConfig) -> Result<Self> {
        Self::with_rng(cfg, StdRng::from_os_rng())
    }

    /// Validate `cfg` and create an engine with a fixed seed (reproducible).
    pub fn with_seed(cfg: AllocationConfig, seed: u64) -> Result<Self> {
        Self::with_rng(cfg, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AllocationEngine<R> {
    /// Validate `cfg` and create an engine drawing from `rng`.
    pub fn with_rng(cfg: AllocationConfig, rng: R) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, rng })
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.cfg
    }

    /// Compute an allocation, returning only the name -> share map.
    pub fn allocate(
        &mut self,
        variants: &[VariantObservation],
        previous: Option<&Allocation>,
    ) -> Result<Allocation> {
        self.compute(variants, previous).map(|r| r.allocation)
    }

    /// Compute an allocation and its report.
    ///
    /// Fails with `InvalidInput` if `variants` is empty, contains an invalid or
    /// duplicate variant, or `previous` holds a share outside `[0, 1]`.
    pub fn compute(
        &mut self,
        variants: &[VariantObservation],
        previous: Option<&Allocation>,
    ) -> Result<AllocationReport> {
        validate_observations(variants)?;
        if let Some(prev) = previous {
            validate_previous(prev)?;
        }

        let cfg = &self.cfg;
        let names = || variants.iter().map(|v| v.name.as_str());
        let total = total_impressions(variants);

        if total < cfg.warmup_threshold {
            tracing::info!(
                total_impressions = total,
                warmup_threshold = cfg.warmup_threshold,
                "insufficient data for optimization, using uniform allocation"
            );
            let allocation = Allocation::uniform(names(), cfg.precision);
            let notes = vec![AllocationNote::WarmupUniform {
                total_impressions: total,
                warmup_threshold: cfg.warmup_threshold,
            }];
            return Ok(build_report(
                cfg,
                AllocationMode::Warmup,
                variants,
                allocation,
                None,
                notes,
            ));
        }

        let posteriors = posteriors(variants, cfg);
        let thetas = sample_thetas(&posteriors, &mut self.rng);
        tracing::debug!(?thetas, "posterior samples");

        let mut notes = Vec::new();
        let raw = raw_allocation(&thetas).unwrap_or_else(|| {
            tracing::warn!("posterior samples summed to zero, using uniform raw shares");
            notes.push(AllocationNote::DegenerateSamples);
            Allocation::equal_shares(names())
        });

        let explored = apply_exploration_floor(&raw, cfg.min_explore_rate);
        notes.extend(explored.notes);
        let floored = apply_control_floor(
            &explored.allocation,
            cfg.protected_variant.as_deref(),
            cfg.control_floor,
        );
        notes.extend(floored.notes);
        let capped = apply_daily_shift_cap(&floored.allocation, previous, cfg.max_daily_shift);
        notes.extend(capped.notes);
        tracing::debug!(allocation = ?capped.allocation, "constrained allocation");

        let allocation = match normalize_rounded(&capped.allocation, cfg.precision) {
            Some(n) => {
                if n.residual_units != 0 {
                    notes.push(AllocationNote::RoundingResidual {
                        variant: n.residual_variant,
                        units: n.residual_units,
                    });
                }
                n.allocation
            }
            None => {
                tracing::warn!("constrained shares summed to zero, using uniform allocation");
                notes.push(AllocationNote::DegenerateNormalization);
                Allocation::uniform(names(), cfg.precision)
            }
        };
        tracing::info!(?allocation, "final allocation");

        let sampled = Sampled {
            posteriors: &posteriors,
            thetas: &thetas,
        };
        Ok(build_report(
            cfg,
            AllocationMode::Optimizing,
            variants,
            allocation,
            Some(sampled),
            notes,
        ))
    }
}

/// Compute an allocation with a freshly OS-seeded engine.
///
/// ```rust
/// use mabsplit::{compute_allocation, AllocationConfig, VariantObservation};
///
/// let variants = vec![
///     VariantObservation::new("control", 100, 10),
///     VariantObservation::new("variant_a", 100, 12),
/// ];
/// // 200 impressions is below the default warmup threshold of 1000.
/// let alloc = compute_allocation(&variants, &AllocationConfig::default(), None).unwrap();
/// assert_eq!(alloc.get("control"), Some(0.5));
/// assert_eq!(alloc.get("variant_a"), Some(0.5));
/// ```
pub fn compute_allocation(
    variants: &[VariantObservation],
    config: &AllocationConfig,
    previous: Option<&Allocation>,
) -> Result<Allocation> {
    AllocationEngine::new(config.clone())?.allocate(variants, previous)
}

fn validate_previous(prev: &Allocation) -> std::result::Result<(), InputError> {
    for (name, &share) in prev.iter() {
        if !share.is_finite() || !(0.0..=1.0).contains(&share) {
            return Err(InputError::InvalidPreviousShare {
                name: name.clone(),
                value: share.to_string(),
            });
        }
    }
    Ok(())
}

struct Sampled<'a> {
    posteriors: &'a BTreeMap<String, BetaPosterior>,
    thetas: &'a BTreeMap<String, f64>,
}

fn build_report(
    cfg: &AllocationConfig,
    mode: AllocationMode,
    variants: &[VariantObservation],
    allocation: Allocation,
    sampled: Option<Sampled<'_>>,
    notes: Vec<AllocationNote>,
) -> AllocationReport {
    let rows = variants
        .iter()
        .map(|v| VariantReport {
            name: v.name.clone(),
            allocation: allocation.get(&v.name).unwrap_or(0.0),
            ctr: v.ctr(),
            impressions: v.impressions,
            clicks: v.clicks,
            conversions: v.conversions,
            posterior: sampled
                .as_ref()
                .and_then(|s| s.posteriors.get(&v.name).copied()),
            sample: sampled.as_ref().and_then(|s| s.thetas.get(&v.name).copied()),
        })
        .collect();

    AllocationReport {
        mode,
        algorithm: ALGORITHM.to_string(),
        parameters: cfg.clone(),
        total_impressions: total_impressions(variants),
        total_clicks: variants.iter().fold(0u64, |acc, v| acc.saturating_add(v.clicks)),
        total_conversions: variants
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(v.conversions)),
        variants: rows,
        notes,
        allocation,
    }
}
