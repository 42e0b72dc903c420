//! Replenishment policy
//!
//! Turns a consumption forecast into a purchase decision. Everything here is
//! a pure function of predicted consumption, current balance and the SKU's
//! consumption variability:
//!
//! ```text
//! safety stock = z * variability * sqrt(lead time / 30)
//! target       = predicted + safety stock
//! order        = max(0, ceil(target - balance))
//! ```

use crate::error::{ForecastError, Result};
use crate::features::{FeatureMatrix, FeatureRow};
use crate::models::EnsembleForecaster;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

const DAYS_PER_MONTH: f64 = 30.0;
const Z_95: f64 = 1.645;
const Z_90: f64 = 1.282;

/// Lead time and service level of the purchasing process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplenishmentPolicy {
    /// Days between placing and receiving an order
    pub lead_time_days: f64,
    /// Target probability of not stocking out during the lead time
    pub service_level: f64,
}

impl Default for ReplenishmentPolicy {
    fn default() -> Self {
        Self {
            lead_time_days: 30.0,
            service_level: 0.95,
        }
    }
}

impl ReplenishmentPolicy {
    pub fn new(lead_time_days: f64, service_level: f64) -> Result<Self> {
        let policy = Self {
            lead_time_days,
            service_level,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lead_time_days.is_finite() && self.lead_time_days > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Lead time must be positive, got {}",
                self.lead_time_days
            )));
        }
        if !(self.service_level > 0.0 && self.service_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Service level must be in (0, 1), got {}",
                self.service_level
            )));
        }
        Ok(())
    }

    /// Two-point z lookup: 95% or anything else (90%)
    pub fn z_score(&self) -> f64 {
        if (self.service_level - 0.95).abs() < 1e-9 {
            Z_95
        } else {
            Z_90
        }
    }

    /// Buffer stock for the given monthly consumption variability
    pub fn safety_stock(&self, variability: f64) -> f64 {
        self.z_score() * variability * (self.lead_time_days / DAYS_PER_MONTH).sqrt()
    }

    /// Units to order; never negative
    pub fn order_quantity(&self, predicted: f64, balance: f64, variability: f64) -> u64 {
        let target = predicted + self.safety_stock(variability);
        let shortfall = (target - balance).ceil();
        if shortfall > 0.0 {
            shortfall as u64
        } else {
            0
        }
    }

    /// Full decision for one feature row and its forecast
    pub fn decide(&self, row: &FeatureRow, predicted: f64) -> Decision {
        let variability = demand_variability(
            Some(row.consumption_stats.std_dev),
            row.consumption_stats.mean,
        );
        let order_quantity = self.order_quantity(predicted, row.balance, variability);

        Decision {
            sku: row.sku.clone(),
            month: row.month,
            consumption: row.consumption,
            balance: row.balance,
            predicted,
            order_quantity,
            recommendation: Recommendation::classify(order_quantity, predicted, row.balance),
            priority: Priority::classify(predicted, row.balance),
        }
    }
}

/// Consumption variability used for safety stock
///
/// Missing std falls back to 30% of mean consumption, a zero std to 10%.
pub fn demand_variability(std_dev: Option<f64>, mean: f64) -> f64 {
    match std_dev {
        None => 0.3 * mean,
        Some(std) if std == 0.0 => 0.1 * mean,
        Some(std) => std,
    }
}

/// Purchase recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    /// Balance covers more than twice the forecast
    Overstocked,
    /// Balance covers the forecast
    Sufficient,
    /// Order up to half the forecast
    BuyMinimum,
    /// Order between half and one and a half times the forecast
    BuyNormal,
    /// Order above one and a half times the forecast
    BuyExtra,
    /// No rule matched
    Review,
}

impl Recommendation {
    /// First matching rule wins
    pub fn classify(order_quantity: u64, predicted: f64, balance: f64) -> Self {
        let order = order_quantity as f64;
        if order_quantity == 0 && balance > 2.0 * predicted {
            Self::Overstocked
        } else if order_quantity == 0 && balance > predicted {
            Self::Sufficient
        } else if order > 0.0 && order <= 0.5 * predicted {
            Self::BuyMinimum
        } else if order > 0.5 * predicted && order <= 1.5 * predicted {
            Self::BuyNormal
        } else if order > 1.5 * predicted {
            Self::BuyExtra
        } else {
            Self::Review
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overstocked => "NO COMPRAR - Exceso de stock",
            Self::Sufficient => "NO COMPRAR - Stock suficiente",
            Self::BuyMinimum => "COMPRAR MÍNIMO - Reposición básica",
            Self::BuyNormal => "COMPRAR NORMAL - Demanda esperada",
            Self::BuyExtra => "COMPRAR EXTRA - Alta demanda/stock bajo",
            Self::Review => "REVISAR",
        }
    }

    pub fn is_purchase(self) -> bool {
        matches!(self, Self::BuyMinimum | Self::BuyNormal | Self::BuyExtra)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Urgency tier, most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Alta,
    Media,
    Baja,
}

impl Priority {
    pub fn classify(predicted: f64, balance: f64) -> Self {
        if balance < 0.3 * predicted && predicted > 0.0 {
            Self::Alta
        } else if balance > 3.0 * predicted {
            Self::Baja
        } else {
            Self::Media
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Alta => "ALTA",
            Self::Media => "MEDIA",
            Self::Baja => "BAJA",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Purchase decision for one (SKU, month) row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub sku: String,
    /// `year * 100 + month` of the row the forecast was made from
    pub month: u32,
    /// Observed consumption of that month
    pub consumption: f64,
    /// Closing balance of that month
    pub balance: f64,
    /// Forecast consumption
    pub predicted: f64,
    pub order_quantity: u64,
    pub recommendation: Recommendation,
    pub priority: Priority,
}

/// Forecast every row of the matrix and decide on each
pub fn plan(
    forecaster: &EnsembleForecaster,
    matrix: &FeatureMatrix,
    policy: &ReplenishmentPolicy,
) -> Result<Vec<Decision>> {
    let predicted = forecaster.predict(matrix)?;
    let decisions: Vec<Decision> = matrix
        .rows()
        .iter()
        .zip(predicted)
        .map(|(row, p)| policy.decide(row, p))
        .collect();

    info!(
        decisions = decisions.len(),
        purchases = decisions.iter().filter(|d| d.order_quantity > 0).count(),
        urgent = decisions
            .iter()
            .filter(|d| d.priority == Priority::Alta)
            .count(),
        "replenishment plan computed"
    );
    Ok(decisions)
}
