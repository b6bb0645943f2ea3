//! Exploration floor and daily-shift cap.
//!
//! Both stages are pure: they take a full allocation snapshot and return a new
//! one, plus notes for anything they changed.

use crate::{Allocation, AllocationNote};

/// Output of a guardrail stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailDecision {
    /// Allocation after the stage ran.
    pub allocation: Allocation,
    /// What the stage changed (empty if nothing).
    pub notes: Vec<AllocationNote>,
}

impl GuardrailDecision {
    fn unchanged(alloc: &Allocation) -> Self {
        Self {
            allocation: alloc.clone(),
            notes: Vec::new(),
        }
    }
}

/// Blend each share with the uniform split:
/// `(1 - rate) * share + rate / N`.
///
/// Every variant keeps at least `rate / N` of traffic (before later stages).
/// `rate` is expected in `[0, 1]`; it is clamped defensively.
pub fn apply_exploration_floor(alloc: &Allocation, rate: f64) -> GuardrailDecision {
    if alloc.is_empty() || rate <= 0.0 {
        return GuardrailDecision::unchanged(alloc);
    }
    let rate = rate.min(1.0);
    let uniform = 1.0 / alloc.len() as f64;
    GuardrailDecision {
        allocation: alloc.map_shares(|_, share| (1.0 - rate) * share + rate * uniform),
        notes: vec![AllocationNote::ExplorationBlended { rate }],
    }
}

/// Bound each share to `previous ± max_shift`.
///
/// Semantics:
/// - `previous = None` disables the cap.
/// - Variants missing from `previous` are left uncapped (and noted).
/// - Entries in `previous` for unknown variants are ignored.
pub fn apply_daily_shift_cap(
    alloc: &Allocation,
    previous: Option<&Allocation>,
    max_shift: f64,
) -> GuardrailDecision {
    let Some(previous) = previous else {
        return GuardrailDecision::unchanged(alloc);
    };

    let mut notes = Vec::new();
    let allocation = alloc.map_shares(|name, proposed| {
        let Some(prev) = previous.get(name) else {
            notes.push(AllocationNote::PreviousShareMissing {
                variant: name.to_string(),
            });
            return proposed;
        };
        let shift = proposed - prev;
        if shift.abs() <= max_shift {
            return proposed;
        }
        let capped = if shift > 0.0 {
            prev + max_shift
        } else {
            prev - max_shift
        };
        tracing::debug!(variant = name, prev, proposed, capped, "daily shift capped");
        notes.push(AllocationNote::DailyShiftCapped {
            variant: name.to_string(),
            previous: prev,
            proposed,
            capped,
        });
        capped
    });

    GuardrailDecision { allocation, notes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(pairs: &[(&str, f64)]) -> Allocation {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn exploration_off_returns_input() {
        let a = alloc(&[("a", 0.9), ("b", 0.1)]);
        let d = apply_exploration_floor(&a, 0.0);
        assert_eq!(d.allocation, a);
        assert!(d.notes.is_empty());
    }

    #[test]
    fn exploration_blends_toward_uniform() {
        let a = alloc(&[("a", 1.0), ("b", 0.0)]);
        let d = apply_exploration_floor(&a, 0.2);
        assert!((d.allocation.get("a").unwrap() - 0.9).abs() < 1e-12);
        assert!((d.allocation.get("b").unwrap() - 0.1).abs() < 1e-12);
        assert!((d.allocation.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn full_exploration_is_uniform() {
        let a = alloc(&[("a", 0.7), ("b", 0.2), ("c", 0.1)]);
        let d = apply_exploration_floor(&a, 1.0);
        for (_, &v) in d.allocation.iter() {
            assert!((v - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn shift_cap_without_previous_is_a_no_op() {
        let a = alloc(&[("a", 0.9), ("b", 0.1)]);
        let d = apply_daily_shift_cap(&a, None, 0.1);
        assert_eq!(d.allocation, a);
        assert!(d.notes.is_empty());
    }

    #[test]
    fn shift_cap_clamps_both_directions() {
        let a = alloc(&[("a", 0.9), ("b", 0.1)]);
        let prev = alloc(&[("a", 0.5), ("b", 0.5)]);
        let d = apply_daily_shift_cap(&a, Some(&prev), 0.1);
        assert!((d.allocation.get("a").unwrap() - 0.6).abs() < 1e-12);
        assert!((d.allocation.get("b").unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(d.notes.len(), 2);
    }

    #[test]
    fn shift_within_cap_is_untouched() {
        let a = alloc(&[("a", 0.55), ("b", 0.45)]);
        let prev = alloc(&[("a", 0.5), ("b", 0.5)]);
        let d = apply_daily_shift_cap(&a, Some(&prev), 0.1);
        assert_eq!(d.allocation, a);
        assert!(d.notes.is_empty());
    }

    #[test]
    fn missing_previous_share_is_left_uncapped() {
        let a = alloc(&[("a", 0.2), ("new", 0.8)]);
        let prev = alloc(&[("a", 0.5), ("retired", 0.5)]);
        let d = apply_daily_shift_cap(&a, Some(&prev), 0.1);
        assert!((d.allocation.get("a").unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(d.allocation.get("new"), Some(0.8));
        assert!(!d.allocation.contains("retired"));
        assert!(d.notes.contains(&AllocationNote::PreviousShareMissing {
            variant: "new".to_string()
        }));
    }
}
