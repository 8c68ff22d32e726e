//! Encoding policy: raw attribute values to fixed-width numeric sub-vectors.
//!
//! Everything here is a pure function of its inputs. Boundaries, category
//! lists and outlier replacements are computed once from the corpus by the
//! builder and then passed back in explicitly.

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Percentile bins for popularity
pub const POPULARITY_BINS: usize = 4;
/// Popularity above this percentile is treated as an outlier
pub const POPULARITY_CLIP_PERCENTILE: f64 = 99.95;
/// Percentile bins for the release year
pub const RELEASE_YEAR_BINS: usize = 10;
/// Fixed inner boundaries for the vote average
pub const VOTE_AVERAGE_BOUNDARIES: [f64; 4] = [2.5, 5.0, 6.125, 7.5];
/// Fixed inner boundaries for the runtime, in minutes
pub const RUNTIME_BOUNDARIES: [f64; 2] = [60.0, 180.0];
/// Collections must be more frequent than this percentile of counts to get a column
pub const COLLECTION_RETAIN_PERCENTILE: f64 = 80.0;

/// Score at percentile `p` (0–100) with linear interpolation between the
/// two closest ranks of the sorted sample.
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(FeatureError::EmptySample);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Inner boundaries splitting `values` into `n_bins` equally populated bins.
///
/// Returns `n_bins - 1` cut points at percentiles `100/n, 200/n, ...`.
pub fn continuous_boundaries(values: &[f64], n_bins: usize) -> Result<Vec<f64>> {
    if n_bins == 0 {
        return Err(FeatureError::InvalidBinCount(n_bins));
    }
    let step = 100.0 / n_bins as f64;
    (1..n_bins)
        .map(|part| percentile(values, step * part as f64))
        .collect()
}

/// One-hot encode a continuous value.
///
/// The hot bin is the first boundary strictly greater than `value`; values at
/// or above the last boundary fall into the trailing overflow bin.
pub fn encode_continuous(value: f64, boundaries: &[f64]) -> Vec<f64> {
    let mut encoded = vec![0.0; boundaries.len() + 1];
    let hot = boundaries
        .iter()
        .position(|bound| value < *bound)
        .unwrap_or(boundaries.len());
    encoded[hot] = 1.0;
    encoded
}

/// Multi-hot encode a set of categories against the retained list.
///
/// With `nullable`, a trailing `unknown` slot is hot when no retained
/// category matched; without it the vector has exactly `retained.len()` slots.
pub fn encode_categorical<T: PartialEq>(values: &[T], retained: &[T], nullable: bool) -> Vec<f64> {
    let mut encoded: Vec<f64> = retained
        .iter()
        .map(|category| if values.contains(category) { 1.0 } else { 0.0 })
        .collect();

    if nullable {
        let matched = encoded.iter().any(|v| *v > 0.0);
        encoded.push(if matched { 0.0 } else { 1.0 });
    }
    encoded
}

/// Every category seen in the corpus, in first-seen order.
pub fn observed_categories<T: Eq + Hash + Clone>(value_sets: &[Vec<T>]) -> Vec<T> {
    let mut seen: HashSet<&T> = HashSet::new();
    value_sets
        .iter()
        .flatten()
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}

/// Keep categories whose occurrence count is strictly above the given
/// percentile of all category counts. Output is in first-seen order.
///
/// With `[[1],[2],[3],[4,3],[5,1],[]]` and percentile 50 the counts are
/// `{1:2, 2:1, 3:2, 4:1, 5:1}`, the median count is 1 and `[1, 3]` is kept.
pub fn retain_frequent_categories<T: Eq + Hash + Clone>(
    value_sets: &[Vec<T>],
    percentile_threshold: f64,
) -> Result<Vec<T>> {
    let order = observed_categories(value_sets);
    if order.is_empty() {
        return Ok(order);
    }

    let mut counts: HashMap<&T, usize> = HashMap::new();
    for value in value_sets.iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let frequencies: Vec<f64> = order.iter().map(|value| counts[value] as f64).collect();
    let threshold = percentile(&frequencies, percentile_threshold)?;

    Ok(order
        .iter()
        .zip(frequencies)
        .filter(|(_, freq)| *freq > threshold)
        .map(|(value, _)| value.clone())
        .collect())
}

/// How a continuous value is repaired before binning.
///
/// Fitted once on the corpus so the same repair can be applied to any record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Use the value as is
    Keep,
    /// Values above `bound` become `mean` (clip-to-mean, not clip-to-bound)
    ClipToMean { bound: f64, mean: f64 },
    /// Zero means missing and becomes `fill`
    FillZero { fill: f64 },
}

impl OutlierPolicy {
    /// Fit clip-to-mean: `bound` is the `upper_percentile` of `values`,
    /// `mean` the mean of every value.
    pub fn fit_clip_to_mean(values: &[f64], upper_percentile: f64) -> Result<Self> {
        let bound = percentile(values, upper_percentile)?;
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Ok(OutlierPolicy::ClipToMean { bound, mean })
    }

    /// Fit zero filling with the truncated mean of the non-zero values.
    ///
    /// If every value is zero there is nothing to fill from and zeros stay.
    pub fn fit_fill_zero(values: &[f64]) -> Self {
        let present: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
        if present.is_empty() {
            return OutlierPolicy::Keep;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        OutlierPolicy::FillZero { fill: mean.trunc() }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            OutlierPolicy::Keep => value,
            OutlierPolicy::ClipToMean { bound, mean } if value > bound => mean,
            OutlierPolicy::FillZero { fill } if value == 0.0 => fill,
            _ => value,
        }
    }
}

/// Replace values above the `upper_percentile` by the corpus mean.
pub fn clip_to_mean(values: &[f64], upper_percentile: f64) -> Result<Vec<f64>> {
    let policy = OutlierPolicy::fit_clip_to_mean(values, upper_percentile)?;
    Ok(values.iter().map(|v| policy.apply(*v)).collect())
}

/// Replace zero (missing) values by the truncated mean of the non-zero ones.
pub fn fill_missing_with_mean(values: &[f64]) -> Vec<f64> {
    let policy = OutlierPolicy::fit_fill_zero(values);
    values.iter().map(|v| policy.apply(*v)).collect()
}
