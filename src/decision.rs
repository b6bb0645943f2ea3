//! Audit trail for allocation computations.
//!
//! Every constraint that changes a share, and every fallback taken, leaves an
//! [`AllocationNote`] in the report. Callers persisting allocations for audit
//! can store the notes next to the config that produced them.

/// Which branch of the engine produced an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AllocationMode {
    /// Too little data: uniform split.
    Warmup,
    /// Thompson sampling plus guardrails.
    Optimizing,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::Warmup => "warmup",
            AllocationMode::Optimizing => "optimizing",
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed notes describing why an allocation looks the way it does.
///
/// Prefer adding new variants over changing existing semantics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum AllocationNote {
    /// Total impressions were below the warmup threshold.
    WarmupUniform {
        total_impressions: u64,
        warmup_threshold: u64,
    },

    /// Sampled thetas summed to zero (or were not finite); raw shares fell back to uniform.
    DegenerateSamples,

    /// Raw shares were blended toward uniform.
    ExplorationBlended { rate: f64 },

    /// The protected variant was below the floor and was raised to it.
    ControlFloorRaised {
        variant: String,
        before: f64,
        floor: f64,
        deficit: f64,
    },

    /// A control floor is configured but no variant carries the protected name.
    ProtectedVariantMissing { variant: String },

    /// A share would have gone negative while absorbing the control deficit.
    ShareClampedAtZero { variant: String },

    /// A share moved more than `max_daily_shift` from the previous allocation.
    DailyShiftCapped {
        variant: String,
        previous: f64,
        proposed: f64,
        capped: f64,
    },

    /// The previous allocation had no entry for this variant; its shift was not capped.
    PreviousShareMissing { variant: String },

    /// Shares summed to zero before normalization; fell back to uniform.
    DegenerateNormalization,

    /// Rounding residual, in units of `10^-precision`, assigned to one variant.
    RoundingResidual { variant: String, units: i64 },
}
