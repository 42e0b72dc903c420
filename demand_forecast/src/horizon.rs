//! Multi-month planning horizons
//!
//! A horizon plan repeats the monthly decision once per month of the horizon
//! from the same feature snapshot and sums the results per SKU. The forecast
//! is not rolled forward between repetitions, so a quarterly forecast is
//! exactly three monthly forecasts.

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::models::EnsembleForecaster;
use crate::policy::{Decision, Priority, ReplenishmentPolicy};
use crate::utils::{add_months, month_label};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Planning horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Monthly,
    Quarterly,
    Annual,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Monthly, Horizon::Quarterly, Horizon::Annual];

    /// Months covered by the horizon
    pub fn periods(self) -> u32 {
        match self {
            Horizon::Monthly => 1,
            Horizon::Quarterly => 3,
            Horizon::Annual => 12,
        }
    }

    /// Column suffix used in exported tables
    pub fn suffix(self) -> &'static str {
        match self {
            Horizon::Monthly => "mensual",
            Horizon::Quarterly => "trimestral",
            Horizon::Annual => "anual",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Horizon::Monthly => "monthly",
            Horizon::Quarterly => "quarterly",
            Horizon::Annual => "annual",
        };
        f.write_str(name)
    }
}

impl FromStr for Horizon {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensual" => Ok(Horizon::Monthly),
            "quarterly" | "trimestral" => Ok(Horizon::Quarterly),
            "annual" | "yearly" | "anual" => Ok(Horizon::Annual),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown horizon '{}', expected monthly, quarterly or annual",
                other
            ))),
        }
    }
}

/// Summed plan of one SKU over a horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonDecision {
    pub sku: String,
    pub horizon: Horizon,
    /// Predicted consumption summed over the horizon
    pub predicted: f64,
    /// Order quantity summed over the horizon
    pub order_quantity: u64,
    /// Balance of the last repetition
    pub balance: f64,
    /// Priority of the first repetition
    pub priority: Priority,
}

/// Plan `horizon` from the latest row of each SKU in `snapshot`
///
/// Older feature rows of a SKU are ignored; each SKU is predicted once from
/// its most recent month and that single decision is repeated per month.
///
/// Never fails: any internal error is logged and yields an empty plan.
pub fn aggregate_horizon(
    forecaster: &EnsembleForecaster,
    snapshot: &FeatureMatrix,
    policy: &ReplenishmentPolicy,
    horizon: Horizon,
) -> Vec<HorizonDecision> {
    match try_aggregate_horizon(forecaster, snapshot, policy, horizon) {
        Ok(plan) => {
            info!(horizon = %horizon, skus = plan.len(), "horizon plan computed");
            plan
        }
        Err(err) => {
            warn!(horizon = %horizon, error = %err, "horizon plan failed, returning empty plan");
            Vec::new()
        }
    }
}

fn try_aggregate_horizon(
    forecaster: &EnsembleForecaster,
    snapshot: &FeatureMatrix,
    policy: &ReplenishmentPolicy,
    horizon: Horizon,
) -> Result<Vec<HorizonDecision>> {
    let latest = snapshot.latest_per_sku();
    let predicted = forecaster.predict(&latest)?;

    let mut repetitions: Vec<Decision> = Vec::new();
    for _ in 0..horizon.periods() {
        for (row, &p) in latest.rows().iter().zip(&predicted) {
            repetitions.push(policy.decide(row, p));
        }
    }

    let mut plan: Vec<HorizonDecision> = Vec::new();
    for decision in repetitions {
        match plan.iter_mut().find(|h| h.sku == decision.sku) {
            Some(entry) => {
                entry.predicted += decision.predicted;
                entry.order_quantity += decision.order_quantity;
                entry.balance = decision.balance;
            }
            None => plan.push(HorizonDecision {
                sku: decision.sku,
                horizon,
                predicted: decision.predicted,
                order_quantity: decision.order_quantity,
                balance: decision.balance,
                priority: decision.priority,
            }),
        }
    }
    Ok(plan)
}

/// `YYYY-MM` labels of the months covered by `horizon`, starting the month after `today`
pub fn horizon_labels(horizon: Horizon, today: NaiveDate) -> Vec<String> {
    (1..=horizon.periods())
        .map(|offset| {
            let (year, month) = add_months(today.year(), today.month(), offset);
            month_label(year, month)
        })
        .collect()
}

/// [`horizon_labels`] from the local date
pub fn upcoming_labels(horizon: Horizon) -> Vec<String> {
    horizon_labels(horizon, Local::now().date_naive())
}
