//! Control floor: a guaranteed minimum share for one protected variant.
//!
//! Adaptive allocation steers traffic away from arms that look worse. The
//! baseline arm of an experiment often has a business-mandated minimum
//! regardless of its measured performance; this stage enforces it.
//!
//! The protected variant is named in [`AllocationConfig::protected_variant`]
//! (default `"control"`). When a floor is configured but no variant carries the
//! name, the stage notes it instead of silently doing nothing.
//!
//! [`AllocationConfig::protected_variant`]: crate::AllocationConfig::protected_variant

use crate::{Allocation, AllocationNote, GuardrailDecision};

/// Raise the protected variant to `floor` if it is below it.
///
/// The deficit is taken evenly from the other `N - 1` variants, each clamped
/// at zero. With a single variant there is nothing to take from and the
/// allocation is returned unchanged.
pub fn apply_control_floor(
    alloc: &Allocation,
    protected: Option<&str>,
    floor: f64,
) -> GuardrailDecision {
    let unchanged = |notes: Vec<AllocationNote>| GuardrailDecision {
        allocation: alloc.clone(),
        notes,
    };

    let Some(protected) = protected else {
        return unchanged(Vec::new());
    };
    let Some(before) = alloc.get(protected) else {
        if floor > 0.0 {
            tracing::debug!(variant = protected, "protected variant not present");
            return unchanged(vec![AllocationNote::ProtectedVariantMissing {
                variant: protected.to_string(),
            }]);
        }
        return unchanged(Vec::new());
    };
    if before >= floor || alloc.len() < 2 {
        return unchanged(Vec::new());
    }

    let deficit = floor - before;
    let per_other = deficit / (alloc.len() - 1) as f64;
    let mut notes = vec![AllocationNote::ControlFloorRaised {
        variant: protected.to_string(),
        before,
        floor,
        deficit,
    }];

    let allocation = alloc.map_shares(|name, share| {
        if name == protected {
            return floor;
        }
        let reduced = share - per_other;
        if reduced < 0.0 {
            notes.push(AllocationNote::ShareClampedAtZero {
                variant: name.to_string(),
            });
            0.0
        } else {
            reduced
        }
    });
    tracing::debug!(variant = protected, before, floor, deficit, "control floor raised");

    GuardrailDecision { allocation, notes }
}
