//! Monthly aggregation of transaction logs
//!
//! Collapses irregular movements into one record per (SKU, calendar month):
//! consumption is summed, the ending balance is the last one observed in the
//! month (input order is taken as chronological order). SKUs with too few
//! months to support lag features are dropped.
//!
//! Aggregation never fails: an empty [`MonthlyTable`] means "not enough data".

use crate::data::TransactionTable;
use crate::error::{ForecastError, Result};
use crate::utils::{add_months, month_key, month_key_of, parse_transaction_date};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Transaction type of an outflow (consumption) movement
pub const OUTFLOW_KIND: &str = "SALIDAS";
/// Transaction type of an opening-balance row, which is not a flow
pub const OPENING_BALANCE_KIND: &str = "SALDO INICIAL";

/// How consumption is derived from a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionRule {
    /// Outflow counts only on rows typed as outflow movements
    TypedOutflow,
    /// Every row's outflow quantity counts as consumption
    AllOutflow,
}

/// Aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub consumption_rule: ConsumptionRule,
    /// First synthetic month for rows without a usable date
    pub synthetic_anchor_year: i32,
    pub synthetic_anchor_month: u32,
    /// Minimum distinct months for a SKU to be kept
    pub min_months: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            consumption_rule: ConsumptionRule::TypedOutflow,
            synthetic_anchor_year: 2023,
            synthetic_anchor_month: 1,
            min_months: 2,
        }
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.synthetic_anchor_month) {
            return Err(ForecastError::InvalidParameter(format!(
                "Synthetic anchor month must be 1-12, got {}",
                self.synthetic_anchor_month
            )));
        }
        if self.min_months < 2 {
            return Err(ForecastError::InvalidParameter(
                "A SKU needs at least 2 months of history".to_string(),
            ));
        }
        Ok(())
    }
}

/// Consumption and closing balance of one SKU in one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub sku: String,
    /// `year * 100 + month`
    pub month: u32,
    pub consumption: f64,
    pub balance: f64,
}

/// Monthly records, unique per (SKU, month), sorted by SKU then month
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyTable {
    records: Vec<MonthlyRecord>,
    has_balances: bool,
}

impl MonthlyTable {
    /// Build from records, keeping the last record of any duplicated (SKU, month)
    pub fn from_records(records: Vec<MonthlyRecord>) -> Self {
        let mut unique: BTreeMap<(String, u32), MonthlyRecord> = BTreeMap::new();
        for record in records {
            unique.insert((record.sku.clone(), record.month), record);
        }
        Self {
            records: unique.into_values().collect(),
            has_balances: true,
        }
    }

    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct SKUs
    pub fn sku_count(&self) -> usize {
        let mut skus: Vec<&str> = self.records.iter().map(|r| r.sku.as_str()).collect();
        skus.dedup();
        skus.len()
    }

    /// Whether balances came from a real column rather than the zero default
    pub fn has_balances(&self) -> bool {
        self.has_balances
    }
}

#[derive(Default)]
struct Bucket {
    consumption: f64,
    balance: f64,
}

/// Aggregate a transaction table into monthly records
pub fn aggregate_monthly(table: &TransactionTable, config: &AggregationConfig) -> MonthlyTable {
    let empty = MonthlyTable {
        records: Vec::new(),
        has_balances: table.has_balances(),
    };

    let rule = match config.consumption_rule {
        ConsumptionRule::TypedOutflow if !table.has_kinds() => {
            warn!("no transaction type column, counting all outflow as consumption");
            ConsumptionRule::AllOutflow
        }
        rule => rule,
    };

    let mut synthetic_index = 0u32;
    let mut buckets: BTreeMap<(String, u32), Bucket> = BTreeMap::new();
    let mut usable_rows = 0usize;

    for row in table.rows() {
        let kind = row.kind.as_deref().map(|k| k.trim().to_uppercase());
        if kind.as_deref() == Some(OPENING_BALANCE_KIND) {
            continue;
        }

        // synthetic months are handed out in row order, whether or not the SKU is usable
        let month = match row.date.as_deref().and_then(parse_transaction_date) {
            Some(date) => month_key_of(date),
            None => {
                let (year, month) = add_months(
                    config.synthetic_anchor_year,
                    config.synthetic_anchor_month,
                    synthetic_index,
                );
                synthetic_index += 1;
                month_key(year, month)
            }
        };

        let Some(sku) = row.sku_key() else {
            continue;
        };

        let consumption = match rule {
            ConsumptionRule::AllOutflow => row.outflow,
            ConsumptionRule::TypedOutflow if kind.as_deref() == Some(OUTFLOW_KIND) => row.outflow,
            ConsumptionRule::TypedOutflow => 0.0,
        };

        let bucket = buckets.entry((sku.to_string(), month)).or_default();
        bucket.consumption += consumption;
        bucket.balance = row.balance;
        usable_rows += 1;
    }

    if usable_rows == 0 {
        warn!("no usable transaction rows after type and SKU filtering");
        return empty;
    }
    if synthetic_index > 0 {
        warn!(rows = synthetic_index, "assigned synthetic months to rows without a usable date");
    }

    let mut months_per_sku: HashMap<&str, usize> = HashMap::new();
    for (sku, _) in buckets.keys() {
        *months_per_sku.entry(sku.as_str()).or_default() += 1;
    }

    let records: Vec<MonthlyRecord> = buckets
        .iter()
        .filter(|((sku, _), _)| months_per_sku[sku.as_str()] >= config.min_months)
        .map(|((sku, month), bucket)| MonthlyRecord {
            sku: sku.clone(),
            month: *month,
            consumption: bucket.consumption,
            balance: bucket.balance,
        })
        .collect();

    let monthly = MonthlyTable {
        records,
        has_balances: table.has_balances(),
    };

    if monthly.is_empty() {
        warn!(
            min_months = config.min_months,
            "no SKU meets the minimum monthly history"
        );
    } else {
        info!(
            records = monthly.len(),
            skus = monthly.sku_count(),
            dropped_skus = months_per_sku.len() - monthly.sku_count(),
            "monthly dataset created"
        );
    }

    monthly
}
