//! Metrics for evaluating forecast accuracy
//!
//! These are diagnostics reported after training; they never reject a model.

use crate::error::{ForecastError, Result};
use serde::Serialize;
use stock_math::statistics::{percentile, SeriesSummary};

/// Relative error band counted as "close enough"
pub const TOLERANCE_BAND: f64 = 0.20;
/// Absolute error above which a prediction is counted as a large miss
pub const LARGE_ERROR: f64 = 100.0;

/// Accuracy of consumption predictions in original units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over non-zero actuals, `None` if all actuals are zero
    pub mape: Option<f64>,
    /// Percentage of non-zero actuals predicted within ±20%
    pub within_tolerance: Option<f64>,
    /// Largest absolute error
    pub max_error: f64,
    /// 95th percentile of absolute errors
    pub p95_error: f64,
    /// Predictions missing by more than `LARGE_ERROR` units
    pub large_errors: usize,
}

/// Evaluate predictions against actual values
pub fn evaluate_forecast(actual: &[f64], predicted: &[f64]) -> Result<ForecastMetrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = actual.len() as f64;
    let abs_errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .collect();

    let mae = abs_errors.iter().sum::<f64>() / n;
    let rmse = (abs_errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();

    let relative: Vec<f64> = actual
        .iter()
        .zip(&abs_errors)
        .filter(|(&a, _)| a != 0.0)
        .map(|(&a, &e)| e / a.abs())
        .collect();

    let (mape, within_tolerance) = if relative.is_empty() {
        (None, None)
    } else {
        let count = relative.len() as f64;
        let within = relative.iter().filter(|&&r| r <= TOLERANCE_BAND).count() as f64;
        (
            Some(relative.iter().sum::<f64>() / count * 100.0),
            Some(within / count * 100.0),
        )
    };

    Ok(ForecastMetrics {
        mae,
        rmse,
        mape,
        within_tolerance,
        max_error: abs_errors.iter().cloned().fold(0.0, f64::max),
        p95_error: percentile(&abs_errors, 95.0)?,
        large_errors: abs_errors.iter().filter(|&&e| e > LARGE_ERROR).count(),
    })
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v));
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:        {:.2}", self.mae)?;
        writeln!(f, "  RMSE:       {:.2}", self.rmse)?;
        writeln!(f, "  MAPE:       {}", pct(self.mape))?;
        writeln!(f, "  Within 20%: {}", pct(self.within_tolerance))?;
        writeln!(f, "  Max error:  {:.2}", self.max_error)?;
        writeln!(f, "  P95 error:  {:.2}", self.p95_error)?;
        writeln!(f, "  Errors > {}: {}", LARGE_ERROR, self.large_errors)?;
        Ok(())
    }
}

/// Distribution of a target column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

impl TargetSummary {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let summary = SeriesSummary::from_values(values)?;
        Ok(Self {
            mean: summary.mean,
            std_dev: summary.std_dev,
            min: summary.min,
            max: summary.max,
            p95: percentile(values, 95.0)?,
        })
    }
}
