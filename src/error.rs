//! Error types for allocation requests and configuration.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AllocationError>;

/// Top-level error returned by the allocation engine.
///
/// Every failure is a validation failure: the inputs or the configuration are
/// malformed. Nothing here is transient, so callers should not retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllocationError {
    /// Variant observations (or the previous allocation) are malformed.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Configuration parameters are out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl AllocationError {
    /// Returns true if this error came from input validation.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AllocationError::InvalidInput(_))
    }

    /// Returns true if this error came from config validation.
    pub fn is_config_error(&self) -> bool {
        matches!(self, AllocationError::InvalidConfig(_))
    }
}

/// Problems with the variant observations supplied to the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// No variants were supplied.
    #[error("at least one variant must be provided")]
    NoVariants,

    /// A variant has an empty name.
    #[error("variant at position {index} has an empty name")]
    EmptyName { index: usize },

    /// The same name appears more than once.
    #[error("duplicate variant name '{name}'")]
    DuplicateName { name: String },

    /// `clicks > impressions`.
    #[error("variant '{name}': clicks ({clicks}) cannot exceed impressions ({impressions})")]
    ClicksExceedImpressions {
        name: String,
        clicks: u64,
        impressions: u64,
    },

    /// `conversions > clicks`.
    #[error("variant '{name}': conversions ({conversions}) cannot exceed clicks ({clicks})")]
    ConversionsExceedClicks {
        name: String,
        conversions: u64,
        clicks: u64,
    },

    /// A previous-allocation share is non-finite or outside `[0, 1]`.
    #[error("previous allocation for '{name}' is {value}, expected a fraction in [0, 1]")]
    InvalidPreviousShare { name: String, value: String },
}

/// Problems with an [`AllocationConfig`][crate::AllocationConfig].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A Beta prior pseudo-count is not a positive finite number.
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositivePrior { field: &'static str, value: String },

    /// A rate parameter is non-finite or outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: String },

    /// Rounding precision outside the supported range.
    #[error("precision must be between 1 and {max} decimal places, got {value}")]
    PrecisionOutOfRange { value: u32, max: u32 },

    /// The floor-protected variant name is empty.
    #[error("protected variant name cannot be empty")]
    EmptyProtectedVariant,

    /// An environment value could not be parsed.
    #[error("{key} has unparseable value '{value}'")]
    Unparseable { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_convert_into_allocation_error() {
        let e: AllocationError = InputError::NoVariants.into();
        assert!(e.is_input_error());
        assert!(!e.is_config_error());
        assert_eq!(
            e.to_string(),
            "invalid input: at least one variant must be provided"
        );
    }

    #[test]
    fn config_errors_render_field_and_value() {
        let e: AllocationError = ConfigError::RateOutOfRange {
            field: "control_floor",
            value: "1.5".to_string(),
        }
        .into();
        assert!(e.is_config_error());
        assert_eq!(
            e.to_string(),
            "invalid config: control_floor must lie in [0, 1], got 1.5"
        );
    }
}
