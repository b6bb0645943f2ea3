//! Property tests for the allocation engine's structural invariants.
//!
//! For any valid request:
//!
//! 1. shares sum to 1 (within 1e-6) and each lies in `[0, 1]`;
//! 2. the key set equals the input name set;
//! 3. a fixed seed reproduces the report exactly;
//! 4. `min_explore_rate = 1` with no protected variant gives the uniform split.

use mabsplit::{Allocation, AllocationConfig, AllocationEngine, VariantObservation};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_variants() -> impl Strategy<Value = Vec<VariantObservation>> {
    (
        any::<bool>(),
        prop::collection::vec((0u64..200_000, 0.0f64..=1.0, 0.0f64..=1.0), 1..8),
    )
        .prop_map(|(with_control, rows)| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (impressions, ctr, cvr))| {
                    let name = if with_control && i == 0 {
                        "control".to_string()
                    } else {
                        format!("variant_{i}")
                    };
                    let clicks = ((impressions as f64) * ctr) as u64;
                    let conversions = ((clicks as f64) * cvr) as u64;
                    VariantObservation::new(name, impressions, clicks.min(impressions))
                        .with_conversions(conversions.min(clicks))
                })
                .collect()
        })
}

fn arb_config() -> impl Strategy<Value = AllocationConfig> {
    (
        0.1f64..10.0,
        0.1f64..10.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
        0u64..5_000,
        2u32..7,
    )
        .prop_map(|(a, b, explore, floor, shift, warmup, precision)| {
            AllocationConfig::default()
                .with_priors(a, b)
                .with_min_explore_rate(explore)
                .with_control_floor(floor)
                .with_max_daily_shift(shift)
                .with_warmup_threshold(warmup)
                .with_precision(precision)
        })
}

/// A previous allocation over (a subset of) the given names, as a simplex.
fn previous_for(variants: &[VariantObservation], weights: &[f64]) -> Allocation {
    let pairs: Vec<(String, f64)> = variants
        .iter()
        .zip(weights.iter())
        .map(|(v, &w)| (v.name.clone(), w))
        .collect();
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    pairs
        .into_iter()
        .map(|(k, w)| (k, if total > 0.0 { w / total } else { 0.0 }))
        .collect()
}

proptest! {
    #[test]
    fn allocation_is_a_complete_distribution(
        variants in arb_variants(),
        cfg in arb_config(),
        prev_weights in prop::option::of(prop::collection::vec(0.0f64..1.0, 0..8)),
        seed in any::<u64>(),
    ) {
        let previous = prev_weights.map(|w| previous_for(&variants, &w));
        let mut engine = AllocationEngine::with_seed(cfg, seed).unwrap();
        let alloc = engine.allocate(&variants, previous.as_ref()).unwrap();

        let input: BTreeSet<&str> = variants.iter().map(|v| v.name.as_str()).collect();
        let output: BTreeSet<&str> = alloc.names().map(|s| s.as_str()).collect();
        prop_assert_eq!(input, output);

        let sum = alloc.total();
        prop_assert!((sum - 1.0).abs() < 1e-6, "sum={}", sum);
        for (name, &v) in alloc.iter() {
            prop_assert!(v.is_finite(), "{} is not finite", name);
            prop_assert!((0.0..=1.0).contains(&v), "{}={}", name, v);
        }
    }

    #[test]
    fn fixed_seed_is_deterministic(
        variants in arb_variants(),
        cfg in arb_config(),
        seed in any::<u64>(),
    ) {
        let r1 = AllocationEngine::with_seed(cfg.clone(), seed)
            .unwrap()
            .compute(&variants, None)
            .unwrap();
        let r2 = AllocationEngine::with_seed(cfg, seed)
            .unwrap()
            .compute(&variants, None)
            .unwrap();
        prop_assert_eq!(r1, r2);
    }

    #[test]
    fn full_exploration_ignores_clicks(
        variants in arb_variants(),
        seed in any::<u64>(),
    ) {
        let cfg = AllocationConfig::default()
            .with_min_explore_rate(1.0)
            .without_protected_variant()
            .with_warmup_threshold(0);
        let alloc = AllocationEngine::with_seed(cfg, seed)
            .unwrap()
            .allocate(&variants, None)
            .unwrap();
        let uniform = Allocation::uniform(variants.iter().map(|v| v.name.as_str()), 4);
        prop_assert_eq!(alloc, uniform);
    }

    #[test]
    fn report_rows_mirror_input(
        variants in arb_variants(),
        seed in any::<u64>(),
    ) {
        let report = AllocationEngine::with_seed(AllocationConfig::default(), seed)
            .unwrap()
            .compute(&variants, None)
            .unwrap();
        prop_assert_eq!(report.variants.len(), variants.len());
        for (row, v) in report.variants.iter().zip(variants.iter()) {
            prop_assert_eq!(&row.name, &v.name);
            prop_assert_eq!(row.impressions, v.impressions);
            prop_assert_eq!(row.clicks, v.clicks);
            prop_assert_eq!(Some(row.allocation), report.allocation.get(&v.name));
        }
    }
}
