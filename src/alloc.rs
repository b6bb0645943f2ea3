//! Allocation maps: variant name -> traffic share.
//!
//! Iteration order is the variant name order (`BTreeMap`), which makes every
//! tie-break in this crate reproducible.

use std::collections::BTreeMap;

/// Traffic split across variants.
///
/// Values are fractions in `[0, 1]`. Allocations produced by the engine sum to
/// exactly `1.0` in units of `10^-precision`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Allocation(BTreeMap<String, f64>);

impl Allocation {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Unrounded `1/N` split over `names`.
    pub fn equal_shares<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut m: BTreeMap<String, f64> = names.into_iter().map(|n| (n.into(), 0.0)).collect();
        let n = m.len() as f64;
        for v in m.values_mut() {
            *v = 1.0 / n;
        }
        Self(m)
    }

    /// Uniform split rounded to `precision` places.
    ///
    /// The rounding residual goes to the first variant by name, so the shares
    /// sum to exactly 1 at that precision.
    pub fn uniform<I, S>(names: I, precision: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let equal = Self::equal_shares(names);
        match normalize_rounded(&equal, precision) {
            Some(r) => r.allocation,
            None => equal,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, share: f64) -> Option<f64> {
        self.0.insert(name.into(), share)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Sum of all shares.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Apply `f(name, share)` to every entry, returning a new allocation.
    pub fn map_shares<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str, f64) -> f64,
    {
        Self(
            self.0
                .iter()
                .map(|(k, &v)| (k.clone(), f(k, v)))
                .collect(),
        )
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.0
    }
}

impl From<BTreeMap<String, f64>> for Allocation {
    fn from(m: BTreeMap<String, f64>) -> Self {
        Self(m)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Allocation {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a Allocation {
    type Item = (&'a String, &'a f64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of [`normalize_rounded`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub allocation: Allocation,
    /// Variant that absorbed the rounding residual.
    pub residual_variant: String,
    /// Residual in units of `10^-precision` (may be negative or zero).
    pub residual_units: i64,
}

/// Rescale `alloc` to sum to one, then round every share to `precision`
/// decimal places.
///
/// The rounding residual is assigned to the variant with the largest
/// pre-rounding share (ties broken by name order), so the rounded shares sum
/// to exactly `10^precision` units. A negative residual larger than that
/// share spills over to the next-largest shares.
///
/// Returns `None` when the input is empty or its sum is not positive and finite.
pub fn normalize_rounded(alloc: &Allocation, precision: u32) -> Option<Normalized> {
    let total = alloc.total();
    if alloc.is_empty() || !total.is_finite() || total <= 0.0 {
        return None;
    }
    let scale = 10i64.pow(precision.min(crate::config::MAX_PRECISION));

    let mut ranked: Vec<(&String, f64)> = Vec::with_capacity(alloc.len());
    let mut units: BTreeMap<&String, i64> = BTreeMap::new();
    for (name, &v) in alloc.iter() {
        let share = (v / total).max(0.0);
        ranked.push((name, share));
        units.insert(name, (share * scale as f64).round() as i64);
    }
    // Largest share first; the stable sort keeps name order among ties.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let target_name = ranked.first()?.0;

    let residual = scale - units.values().sum::<i64>();
    let mut remaining = residual;
    for (name, _) in &ranked {
        if remaining == 0 {
            break;
        }
        if let Some(u) = units.get_mut(name) {
            let adjusted = (*u + remaining).max(0);
            remaining -= adjusted - *u;
            *u = adjusted;
        }
    }

    let allocation = units
        .into_iter()
        .map(|(k, u)| (k.clone(), u as f64 / scale as f64))
        .collect();
    Some(Normalized {
        allocation,
        residual_variant: target_name.clone(),
        residual_units: residual,
    })
}
