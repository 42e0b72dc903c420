//! Feature construction from monthly records
//!
//! For every (SKU, month) row the builder derives calendar features, the
//! SKU's whole-history statistics, 1-3 month lags of consumption and balance,
//! a 3-month trailing mean and days of inventory. Rows whose lags cannot be
//! resolved are dropped, so a SKU contributes rows only from its fourth month.
//!
//! Feature schema:
//!
//! | feature                         | source      | when the source is missing |
//! |---------------------------------|-------------|----------------------------|
//! | month number, quarter, flags    | month key   | always present             |
//! | consumption mean/std/min/max    | consumption | always present             |
//! | consumption lags, rolling mean  | consumption | always present             |
//! | balance lags, days of inventory | balance     | zero (balance defaults 0)  |

use crate::aggregate::MonthlyTable;
use crate::error::{ForecastError, Result};
use crate::utils::{quarter_of, split_month_key};
use serde::{Deserialize, Serialize};
use stock_math::statistics::{lagged, trailing_mean, SeriesSummary};
use tracing::{info, warn};

/// Number of lagged months per series
pub const MAX_LAG: usize = 3;
/// Window of the trailing consumption mean
pub const ROLLING_WINDOW: usize = 3;
/// Days per month used by days-of-inventory
const DAYS_PER_MONTH: f64 = 30.0;

/// Where a feature's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    Calendar,
    Consumption,
    Balance,
}

/// Model input columns, in model order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    MonthNumber,
    Quarter,
    YearEnd,
    YearStart,
    ConsumptionMean,
    ConsumptionStd,
    ConsumptionMin,
    ConsumptionMax,
    ConsumptionLag1,
    ConsumptionLag2,
    ConsumptionLag3,
    BalanceLag1,
    BalanceLag2,
    BalanceLag3,
    ConsumptionRollingMean3,
    DaysOfInventory,
}

impl FeatureColumn {
    /// Every feature the model uses, in model order
    pub const ALL: [FeatureColumn; 16] = [
        FeatureColumn::MonthNumber,
        FeatureColumn::Quarter,
        FeatureColumn::YearEnd,
        FeatureColumn::YearStart,
        FeatureColumn::ConsumptionMean,
        FeatureColumn::ConsumptionStd,
        FeatureColumn::ConsumptionMin,
        FeatureColumn::ConsumptionMax,
        FeatureColumn::ConsumptionLag1,
        FeatureColumn::ConsumptionLag2,
        FeatureColumn::ConsumptionLag3,
        FeatureColumn::BalanceLag1,
        FeatureColumn::BalanceLag2,
        FeatureColumn::BalanceLag3,
        FeatureColumn::ConsumptionRollingMean3,
        FeatureColumn::DaysOfInventory,
    ];

    /// Column name as stored in persisted models and exports
    pub fn name(self) -> &'static str {
        match self {
            Self::MonthNumber => "mes_num",
            Self::Quarter => "trimestre",
            Self::YearEnd => "es_fin_ano",
            Self::YearStart => "es_inicio_ano",
            Self::ConsumptionMean => "consumo_mean",
            Self::ConsumptionStd => "consumo_std",
            Self::ConsumptionMin => "consumo_min",
            Self::ConsumptionMax => "consumo_max",
            Self::ConsumptionLag1 => "consumo_lag_1",
            Self::ConsumptionLag2 => "consumo_lag_2",
            Self::ConsumptionLag3 => "consumo_lag_3",
            Self::BalanceLag1 => "saldo_lag_1",
            Self::BalanceLag2 => "saldo_lag_2",
            Self::BalanceLag3 => "saldo_lag_3",
            Self::ConsumptionRollingMean3 => "consumo_rolling_mean_3",
            Self::DaysOfInventory => "dias_inventario",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn source(self) -> FeatureSource {
        match self {
            Self::MonthNumber | Self::Quarter | Self::YearEnd | Self::YearStart => {
                FeatureSource::Calendar
            }
            Self::BalanceLag1 | Self::BalanceLag2 | Self::BalanceLag3 | Self::DaysOfInventory => {
                FeatureSource::Balance
            }
            _ => FeatureSource::Consumption,
        }
    }

    /// Mandatory features need a real source column; the others default to zero
    pub fn is_mandatory(self) -> bool {
        self.source() != FeatureSource::Balance
    }
}

/// One fully-populated (SKU, month) row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub sku: String,
    /// `year * 100 + month`
    pub month: u32,
    pub year: i32,
    pub month_number: u32,
    pub quarter: u32,
    /// Consumption in this month, the training target
    pub consumption: f64,
    /// Closing balance of this month
    pub balance: f64,
    /// Whole-history consumption statistics of the SKU
    pub consumption_stats: SeriesSummary,
    /// Whole-history balance statistics of the SKU
    pub balance_stats: SeriesSummary,
    pub consumption_lags: [f64; MAX_LAG],
    pub balance_lags: [f64; MAX_LAG],
    pub rolling_mean: f64,
    pub year_end: bool,
    pub year_start: bool,
    pub days_of_inventory: f64,
}

impl FeatureRow {
    /// Value of a single feature
    pub fn value(&self, column: FeatureColumn) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match column {
            FeatureColumn::MonthNumber => self.month_number as f64,
            FeatureColumn::Quarter => self.quarter as f64,
            FeatureColumn::YearEnd => flag(self.year_end),
            FeatureColumn::YearStart => flag(self.year_start),
            FeatureColumn::ConsumptionMean => self.consumption_stats.mean,
            FeatureColumn::ConsumptionStd => self.consumption_stats.std_dev,
            FeatureColumn::ConsumptionMin => self.consumption_stats.min,
            FeatureColumn::ConsumptionMax => self.consumption_stats.max,
            FeatureColumn::ConsumptionLag1 => self.consumption_lags[0],
            FeatureColumn::ConsumptionLag2 => self.consumption_lags[1],
            FeatureColumn::ConsumptionLag3 => self.consumption_lags[2],
            FeatureColumn::BalanceLag1 => self.balance_lags[0],
            FeatureColumn::BalanceLag2 => self.balance_lags[1],
            FeatureColumn::BalanceLag3 => self.balance_lags[2],
            FeatureColumn::ConsumptionRollingMean3 => self.rolling_mean,
            FeatureColumn::DaysOfInventory => self.days_of_inventory,
        }
    }

    /// Values of the given features, in order
    pub fn vector(&self, columns: &[FeatureColumn]) -> Vec<f64> {
        columns.iter().map(|&c| self.value(c)).collect()
    }
}

/// Clean feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<FeatureColumn>,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<FeatureColumn>, rows: Vec<FeatureRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature values, one vector per row
    pub fn design_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.vector(&self.columns)).collect()
    }

    /// Consumption of each row
    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.consumption).collect()
    }

    /// Number of distinct SKUs
    pub fn sku_count(&self) -> usize {
        let mut skus: Vec<&str> = self.rows.iter().map(|r| r.sku.as_str()).collect();
        skus.sort_unstable();
        skus.dedup();
        skus.len()
    }

    /// The most recent row of each SKU, the current state to plan from
    pub fn latest_per_sku(&self) -> FeatureMatrix {
        let mut rows: Vec<FeatureRow> = Vec::new();
        for row in &self.rows {
            match rows.iter_mut().find(|r| r.sku == row.sku) {
                Some(existing) if existing.month < row.month => *existing = row.clone(),
                Some(_) => {}
                None => rows.push(row.clone()),
            }
        }
        rows.sort_by(|a, b| a.sku.cmp(&b.sku));
        FeatureMatrix::new(self.columns.clone(), rows)
    }
}

/// Build the feature matrix from a non-empty monthly table
pub fn build_features(monthly: &MonthlyTable) -> Result<FeatureMatrix> {
    if monthly.is_empty() {
        return Err(ForecastError::InsufficientData(
            "Monthly dataset is empty".to_string(),
        ));
    }
    if !monthly.has_balances() {
        warn!("no balance column, balance features default to zero");
    }

    let mut records = monthly.records().to_vec();
    records.sort_by(|a, b| a.sku.cmp(&b.sku).then(a.month.cmp(&b.month)));

    let mut rows = Vec::new();
    let mut start = 0;
    while start < records.len() {
        let sku = &records[start].sku;
        let end = start
            + records[start..]
                .iter()
                .take_while(|r| &r.sku == sku)
                .count();
        let history = &records[start..end];

        let consumption: Vec<f64> = history.iter().map(|r| r.consumption).collect();
        let balance: Vec<f64> = history.iter().map(|r| r.balance).collect();
        let consumption_stats = SeriesSummary::from_values(&consumption)?.rounded(2);
        let balance_stats = SeriesSummary::from_values(&balance)?.rounded(2);

        let consumption_lags: Vec<Vec<Option<f64>>> =
            (1..=MAX_LAG).map(|lag| lagged(&consumption, lag)).collect();
        let balance_lags: Vec<Vec<Option<f64>>> =
            (1..=MAX_LAG).map(|lag| lagged(&balance, lag)).collect();
        let rolling = trailing_mean(&consumption, ROLLING_WINDOW)?;

        for (i, record) in history.iter().enumerate() {
            let (Some(c_lags), Some(b_lags)) = (
                resolve_lags(&consumption_lags, i),
                resolve_lags(&balance_lags, i),
            ) else {
                continue;
            };

            let (year, month_number) = split_month_key(record.month);
            let days_of_inventory = if consumption_stats.mean > 0.0 {
                record.balance / (consumption_stats.mean / DAYS_PER_MONTH)
            } else {
                0.0
            };

            rows.push(FeatureRow {
                sku: record.sku.clone(),
                month: record.month,
                year,
                month_number,
                quarter: quarter_of(month_number),
                consumption: record.consumption,
                balance: record.balance,
                consumption_stats,
                balance_stats,
                consumption_lags: c_lags,
                balance_lags: b_lags,
                rolling_mean: rolling[i],
                year_end: matches!(month_number, 11 | 12 | 1),
                year_start: matches!(month_number, 1..=3),
                days_of_inventory,
            });
        }

        start = end;
    }

    let matrix = FeatureMatrix::new(FeatureColumn::ALL.to_vec(), rows);
    info!(
        rows = matrix.len(),
        skus = matrix.sku_count(),
        "feature matrix built"
    );
    Ok(matrix)
}

fn resolve_lags(lags: &[Vec<Option<f64>>], index: usize) -> Option<[f64; MAX_LAG]> {
    let mut resolved = [0.0; MAX_LAG];
    for (slot, series) in resolved.iter_mut().zip(lags) {
        *slot = series[index]?;
    }
    Some(resolved)
}
