//! `mabsplit`: Thompson-sampling traffic allocation for A/B/n experiments.
//!
//! Given per-variant aggregate counters over a lookback window
//! ([`VariantObservation`]: impressions, clicks, optional conversions) and,
//! optionally, yesterday's [`Allocation`], the engine recommends a traffic
//! split that is:
//!
//! - **Adaptive**: each variant's click-through rate is a Beta posterior; one
//!   Thompson draw per variant, normalized, gives the raw split.
//! - **Safe**: an exploration floor keeps every arm alive, a control floor
//!   protects the baseline, and a daily-shift cap bounds churn.
//! - **Exact**: shares are rounded to a fixed precision and always sum to 1.
//!
//! There are two operating modes, chosen per call from current total
//! impressions only:
//!
//! - [`AllocationMode::Warmup`]: too little data; uniform split.
//! - [`AllocationMode::Optimizing`]: sampling plus guardrails.
//!
//! ```rust
//! use mabsplit::{AllocationConfig, AllocationEngine, AllocationMode, VariantObservation};
//!
//! let variants = vec![
//!     VariantObservation::new("control", 12_000, 480),
//!     VariantObservation::new("variant_a", 12_000, 720),
//! ];
//! // Seeded for a reproducible doc test; production code uses `AllocationEngine::new`.
//! let mut engine = AllocationEngine::with_seed(AllocationConfig::default(), 42).unwrap();
//! let report = engine.compute(&variants, None).unwrap();
//!
//! assert_eq!(report.mode, AllocationMode::Optimizing);
//! assert!((report.allocation.total() - 1.0).abs() < 1e-6);
//! assert!(report.allocation.get("control").unwrap() >= 0.1);
//! ```
//!
//! **Randomness:** the engine is generic over any [`rand::Rng`]. The default
//! constructor seeds from the OS so that successive days draw fresh samples;
//! fixed seeds are for tests and replays.
//!
//! **Stages:** every constraint is a pure function over a full allocation
//! snapshot ([`apply_exploration_floor`], [`apply_control_floor`],
//! [`apply_daily_shift_cap`], [`normalize_rounded`]), so each can be tested
//! and reasoned about on its own.
//!
//! **Non-goals:**
//! - No persistence, transport, or request parsing; callers supply aggregated
//!   counts and store the results.
//! - No state across experiments or calls beyond the caller-supplied previous
//!   allocation.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod config;
pub use config::*;

mod observation;
pub use observation::*;

mod alloc;
pub use alloc::*;

mod thompson;
pub use thompson::*;

mod decision;
pub use decision::*;

mod guardrail;
pub use guardrail::*;

mod control;
pub use control::*;

mod engine;
pub use engine::*;
