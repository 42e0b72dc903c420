//! # Stock Math
//!
//! Numeric building blocks for inventory demand forecasting.
//! This crate provides descriptive statistics over monthly series, the
//! feature and target scalers, and the regression trees that the demand
//! ensemble is made of. It does no I/O.

use thiserror::Error;

pub mod ensemble;
pub mod scaling;
pub mod statistics;
pub mod transform;
pub mod tree;

pub use ensemble::{BaggedForest, BoostingParams, ForestParams, GradientBoostedTrees};
pub use scaling::{StandardScaler, TargetScaler};
pub use transform::{TargetTransform, TransformKind};
pub use tree::{RegressionTree, TreeParams};

/// Errors that can occur in forecasting math
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// A fitted model mapping one feature row to one value.
pub trait Regressor {
    /// Predict the value for a single feature row
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict one value per row
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Check that a design matrix is non-empty, rectangular and matches its targets.
pub(crate) fn validate_design(features: &[Vec<f64>], targets: &[f64]) -> Result<usize> {
    if features.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot fit on an empty design matrix".to_string(),
        ));
    }
    if features.len() != targets.len() {
        return Err(MathError::InvalidInput(format!(
            "Feature rows ({}) do not match target length ({})",
            features.len(),
            targets.len()
        )));
    }

    let width = features[0].len();
    if width == 0 {
        return Err(MathError::InvalidInput(
            "Feature rows have no columns".to_string(),
        ));
    }
    if let Some(bad) = features.iter().position(|row| row.len() != width) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has {} columns, expected {}",
            bad,
            features[bad].len(),
            width
        )));
    }
    if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Design matrix contains non-finite values".to_string(),
        ));
    }

    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_design_rejects_ragged_rows() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let targets = vec![1.0, 2.0];
        assert!(matches!(
            validate_design(&features, &targets),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_design_rejects_empty() {
        assert!(matches!(
            validate_design(&[], &[]),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_validate_design_width() {
        let features = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        assert_eq!(validate_design(&features, &[0.0, 1.0]).unwrap(), 3);
    }
}
