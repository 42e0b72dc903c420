//! Variance-stabilizing target transforms
//!
//! Consumption is non-negative and heavy tailed across SKUs, so the ensemble
//! is trained on `ln(1 + y)` by default. Standard scaling is the alternative.
//! A fitted transform remembers its mode and only inverts with it.

use crate::scaling::TargetScaler;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Which transform to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Log1p,
    Standardize,
}

/// A fitted target transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetTransform {
    /// `y' = ln(1 + y)`, stateless
    Log1p,
    /// `y' = (y - mean) / std` fitted on training targets
    Standardize(TargetScaler),
}

impl TargetTransform {
    /// Fit a transform of the given kind on training targets
    pub fn fit(kind: TransformKind, targets: &[f64]) -> Result<Self> {
        match kind {
            TransformKind::Log1p => Ok(Self::Log1p),
            TransformKind::Standardize => Ok(Self::Standardize(TargetScaler::fit(targets)?)),
        }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Log1p => TransformKind::Log1p,
            Self::Standardize(_) => TransformKind::Standardize,
        }
    }

    /// The fitted scaler, if the transform is a standard scaling
    pub fn scaler(&self) -> Option<&TargetScaler> {
        match self {
            Self::Log1p => None,
            Self::Standardize(scaler) => Some(scaler),
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Log1p => value.ln_1p(),
            Self::Standardize(scaler) => scaler.transform(value),
        }
    }

    pub fn invert(&self, value: f64) -> f64 {
        match self {
            Self::Log1p => value.exp_m1(),
            Self::Standardize(scaler) => scaler.inverse(value),
        }
    }

    pub fn apply_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.apply(v)).collect()
    }

    pub fn invert_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.invert(v)).collect()
    }
}
