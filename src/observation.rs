//! Per-variant aggregate counters and their validation.

use std::collections::{BTreeSet, HashMap};

use crate::error::InputError;

/// One variant's aggregated performance over a lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariantObservation {
    /// Variant name, unique within a request.
    pub name: String,
    /// Number of exposures.
    pub impressions: u64,
    /// Number of positive outcomes (`clicks <= impressions`).
    pub clicks: u64,
    /// Downstream conversions (`conversions <= clicks`). Not used by the allocation math.
    #[cfg_attr(feature = "serde", serde(default))]
    pub conversions: u64,
}

impl VariantObservation {
    pub fn new(name: impl Into<String>, impressions: u64, clicks: u64) -> Self {
        Self {
            name: name.into(),
            impressions,
            clicks,
            conversions: 0,
        }
    }

    pub fn with_conversions(mut self, conversions: u64) -> Self {
        self.conversions = conversions;
        self
    }

    /// Click-through rate; `0.0` when there are no impressions.
    pub fn ctr(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            (self.clicks as f64) / (self.impressions as f64)
        }
    }

    /// Impressions that did not produce a click.
    pub fn failures(&self) -> u64 {
        self.impressions.saturating_sub(self.clicks)
    }

    /// Check the per-variant count invariants.
    pub fn validate(&self, index: usize) -> Result<(), InputError> {
        if self.name.is_empty() {
            return Err(InputError::EmptyName { index });
        }
        if self.clicks > self.impressions {
            return Err(InputError::ClicksExceedImpressions {
                name: self.name.clone(),
                clicks: self.clicks,
                impressions: self.impressions,
            });
        }
        if self.conversions > self.clicks {
            return Err(InputError::ConversionsExceedClicks {
                name: self.name.clone(),
                conversions: self.conversions,
                clicks: self.clicks,
            });
        }
        Ok(())
    }
}

/// Validate a full request: non-empty, every variant valid, names unique.
pub fn validate_observations(variants: &[VariantObservation]) -> Result<(), InputError> {
    if variants.is_empty() {
        return Err(InputError::NoVariants);
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (i, v) in variants.iter().enumerate() {
        v.validate(i)?;
        if !seen.insert(v.name.as_str()) {
            return Err(InputError::DuplicateName {
                name: v.name.clone(),
            });
        }
    }
    Ok(())
}

/// Sum impressions over all variants (saturating).
pub fn total_impressions(variants: &[VariantObservation]) -> u64 {
    variants
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(v.impressions))
}

/// Collapse per-period rows (e.g. one per variant per day) into one
/// observation per variant name.
///
/// Counts are summed with saturation. Output order is the order in which each
/// name was first seen. No validation is performed here; run the result
/// through [`validate_observations`] (the engine does this for you).
pub fn aggregate_observations<'a, I>(rows: I) -> Vec<VariantObservation>
where
    I: IntoIterator<Item = &'a VariantObservation>,
{
    let mut out: Vec<VariantObservation> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        match index.get(&row.name) {
            Some(&i) => {
                let acc = &mut out[i];
                acc.impressions = acc.impressions.saturating_add(row.impressions);
                acc.clicks = acc.clicks.saturating_add(row.clicks);
                acc.conversions = acc.conversions.saturating_add(row.conversions);
            }
            None => {
                index.insert(row.name.clone(), out.len());
                out.push(row.clone());
            }
        }
    }
    out
}
