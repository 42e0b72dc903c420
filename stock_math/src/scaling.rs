//! Zero-mean, unit-variance scalers
//!
//! `StandardScaler` works column-wise on feature rows, `TargetScaler` on a
//! single target column. Both use the population standard deviation and fall
//! back to a unit scale for constant columns so transforms stay finite.

use crate::{validate_design, MathError, Result};
use serde::{Deserialize, Serialize};

fn unit_if_degenerate(std_dev: f64) -> f64 {
    if std_dev.is_finite() && std_dev > f64::EPSILON {
        std_dev
    } else {
        1.0
    }
}

/// Column-wise standard scaler for feature rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit the scaler on training rows
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = validate_design(rows, &vec![0.0; rows.len()])?;
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((var, value), mean) in variances.iter_mut().zip(row).zip(&means) {
                *var += (value - mean).powi(2);
            }
        }

        let scales = variances
            .into_iter()
            .map(|v| unit_if_degenerate((v / n).sqrt()))
            .collect();

        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Scale rows with the fitted statistics
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.width() {
                    return Err(MathError::InvalidInput(format!(
                        "Row has {} columns, scaler was fitted on {}",
                        row.len(),
                        self.width()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(value, (mean, scale))| (value - mean) / scale)
                    .collect())
            })
            .collect()
    }
}

/// Standard scaler for a single target column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    mean: f64,
    scale: f64,
}

impl TargetScaler {
    /// Fit on training targets
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a target scaler on no values".to_string(),
            ));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Ok(Self {
            mean,
            scale: unit_if_degenerate(variance.sqrt()),
        })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    pub fn inverse(&self, value: f64) -> f64 {
        value * self.scale + self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_standard_scaler_centers_columns() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows).unwrap();

        let col0: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        assert_approx_eq!(col0.iter().sum::<f64>(), 0.0);
        assert_approx_eq!(col0[2], 1.5f64.sqrt());

        // constant column keeps a unit scale
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn test_standard_scaler_width_mismatch() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        assert!(scaler.transform(&[vec![1.0]]).is_err());
    }

    #[test]
    fn test_target_scaler_inverse() {
        let scaler = TargetScaler::fit(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        for value in [0.0, 3.5, 100.0] {
            assert_approx_eq!(scaler.inverse(scaler.transform(value)), value);
        }
        assert_approx_eq!(scaler.transform(5.0), 0.0);
    }
}
