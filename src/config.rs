//! Allocation parameters.
//!
//! An [`AllocationConfig`] is immutable for the duration of one computation and
//! is validated before any sampling happens, so a bad parameter can never
//! produce a misleading allocation.

use crate::error::ConfigError;

/// Largest supported rounding precision (decimal places).
pub const MAX_PRECISION: u32 = 9;

/// Default name of the floor-protected variant.
pub const DEFAULT_PROTECTED_VARIANT: &str = "control";

/// Algorithm parameters for one allocation computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AllocationConfig {
    /// Beta prior alpha (pseudo-successes). Must be > 0.
    pub alpha_prior: f64,
    /// Beta prior beta (pseudo-failures). Must be > 0.
    pub beta_prior: f64,
    /// Fraction of traffic blended toward the uniform split, in `[0, 1]`.
    pub min_explore_rate: f64,
    /// Minimum share guaranteed to the protected variant, in `[0, 1]`.
    pub control_floor: f64,
    /// Maximum per-variant change from the previous allocation, in `[0, 1]`.
    pub max_daily_shift: f64,
    /// Total impressions required before leaving the uniform warmup split.
    pub warmup_threshold: u64,
    /// Variant that receives the control floor. `None` disables the floor.
    pub protected_variant: Option<String>,
    /// Decimal places the final allocation is rounded to.
    pub precision: u32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            alpha_prior: 1.0,
            beta_prior: 1.0,
            min_explore_rate: 0.05,
            control_floor: 0.1,
            max_daily_shift: 0.2,
            warmup_threshold: 1000,
            protected_variant: Some(DEFAULT_PROTECTED_VARIANT.to_string()),
            precision: 4,
        }
    }
}

impl AllocationConfig {
    /// Set the Beta prior pseudo-counts.
    pub fn with_priors(mut self, alpha_prior: f64, beta_prior: f64) -> Self {
        self.alpha_prior = alpha_prior;
        self.beta_prior = beta_prior;
        self
    }

    pub fn with_min_explore_rate(mut self, rate: f64) -> Self {
        self.min_explore_rate = rate;
        self
    }

    pub fn with_control_floor(mut self, floor: f64) -> Self {
        self.control_floor = floor;
        self
    }

    pub fn with_max_daily_shift(mut self, shift: f64) -> Self {
        self.max_daily_shift = shift;
        self
    }

    pub fn with_warmup_threshold(mut self, threshold: u64) -> Self {
        self.warmup_threshold = threshold;
        self
    }

    /// Set the floor-protected variant name.
    pub fn with_protected_variant(mut self, name: impl Into<String>) -> Self {
        self.protected_variant = Some(name.into());
        self
    }

    /// Disable the control floor entirely.
    pub fn without_protected_variant(mut self) -> Self {
        self.protected_variant = None;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_prior("alpha_prior", self.alpha_prior)?;
        check_prior("beta_prior", self.beta_prior)?;
        check_rate("min_explore_rate", self.min_explore_rate)?;
        check_rate("control_floor", self.control_floor)?;
        check_rate("max_daily_shift", self.max_daily_shift)?;
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(ConfigError::PrecisionOutOfRange {
                value: self.precision,
                max: MAX_PRECISION,
            });
        }
        if matches!(self.protected_variant.as_deref(), Some("")) {
            return Err(ConfigError::EmptyProtectedVariant);
        }
        Ok(())
    }

    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Recognized keys: `ALPHA_PRIOR`, `BETA_PRIOR`, `MIN_EXPLORE_RATE`,
    /// `CONTROL_FLOOR`, `MAX_DAILY_SHIFT`, `MIN_IMPRESSIONS_FOR_OPTIMIZATION`,
    /// `CONTROL_VARIANT` (empty string disables the floor) and
    /// `ALLOCATION_PRECISION`. The result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let protected_variant = match lookup("CONTROL_VARIANT") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => defaults.protected_variant,
        };

        let cfg = Self {
            alpha_prior: parse_or(&lookup, "ALPHA_PRIOR", defaults.alpha_prior)?,
            beta_prior: parse_or(&lookup, "BETA_PRIOR", defaults.beta_prior)?,
            min_explore_rate: parse_or(&lookup, "MIN_EXPLORE_RATE", defaults.min_explore_rate)?,
            control_floor: parse_or(&lookup, "CONTROL_FLOOR", defaults.control_floor)?,
            max_daily_shift: parse_or(&lookup, "MAX_DAILY_SHIFT", defaults.max_daily_shift)?,
            warmup_threshold: parse_or(
                &lookup,
                "MIN_IMPRESSIONS_FOR_OPTIMIZATION",
                defaults.warmup_threshold,
            )?,
            protected_variant,
            precision: parse_or(&lookup, "ALLOCATION_PRECISION", defaults.precision)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Unparseable {
            key,
            value: raw,
        }),
    }
}

fn check_prior(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositivePrior {
            field,
            value: value.to_string(),
        })
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange {
            field,
            value: value.to_string(),
        })
    }
}
