//! Descriptive statistics over monthly series
//!
//! Contains the helpers the feature builder and the training diagnostics need:
//! - Per-series summaries (mean, population std, min, max, sum)
//! - Lagged views and trailing rolling means
//! - Linear-interpolated percentiles

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Summary statistics of one series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Sum of all values
    pub sum: f64,
    /// Number of values
    pub count: usize,
}

impl SeriesSummary {
    /// Summarize a non-empty series
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot summarize an empty series".to_string(),
            ));
        }

        Ok(Self {
            mean: Statistics::mean(values),
            std_dev: Statistics::population_std_dev(values),
            min: Statistics::min(values),
            max: Statistics::max(values),
            sum: values.iter().sum(),
            count: values.len(),
        })
    }

    /// Round every statistic to the given number of decimals
    pub fn rounded(self, decimals: i32) -> Self {
        Self {
            mean: round_to(self.mean, decimals),
            std_dev: round_to(self.std_dev, decimals),
            min: round_to(self.min, decimals),
            max: round_to(self.max, decimals),
            sum: round_to(self.sum, decimals),
            count: self.count,
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Shift a series forward by `lag` positions; the first `lag` entries are `None`
pub fn lagged(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| i.checked_sub(lag).map(|j| values[j]))
        .collect()
}

/// Trailing rolling mean whose window shrinks at the start of the series
pub fn trailing_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }

    Ok((0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect())
}

/// Percentile with linear interpolation between closest ranks, `q` in [0, 100]
pub fn percentile(values: &[f64], q: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a percentile of an empty series".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(MathError::InvalidInput(format!(
            "Percentile must be within [0, 100], got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
