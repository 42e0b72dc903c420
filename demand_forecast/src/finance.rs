//! Financial and coverage summaries of a replenishment plan

use crate::data::TransactionTable;
use crate::policy::{Decision, Priority};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Days of forecast consumption above which a SKU is overstocked
pub const OVERSTOCK_DAYS: f64 = 90.0;
/// Days of forecast consumption below which a SKU risks a stockout
pub const STOCKOUT_DAYS: f64 = 15.0;
const DAYS_PER_MONTH: f64 = 30.0;

/// Headline money figures of a plan
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FinancialSummary {
    /// Sum of the last observed balance of each SKU
    pub inventory_on_hand: f64,
    /// Cost of every recommended purchase at the last known unit cost
    pub purchase_cost: f64,
    /// Cost of urgent purchases, i.e. ALTA priority with a non-zero order
    pub stockout_risk_value: f64,
    /// Distinct SKUs behind `stockout_risk_value`
    pub skus_at_risk: usize,
}

impl FinancialSummary {
    /// Combine the transaction log (balances, costs) with the plan's decisions
    ///
    /// SKUs without a known unit cost are priced at zero.
    pub fn compute(transactions: &TransactionTable, decisions: &[Decision]) -> Self {
        let mut last: BTreeMap<&str, (f64, Option<f64>)> = BTreeMap::new();
        for row in transactions.rows() {
            let Some(sku) = row.sku_key() else { continue };
            let entry = last.entry(sku).or_insert((0.0, None));
            entry.0 = row.balance;
            if row.unit_cost.is_some() {
                entry.1 = row.unit_cost;
            }
        }

        let inventory_on_hand: f64 = last.values().map(|(balance, _)| balance).sum();
        let cost_of = |d: &Decision| {
            let unit = last.get(d.sku.as_str()).and_then(|(_, c)| *c).unwrap_or(0.0);
            d.order_quantity as f64 * unit
        };

        let purchase_cost: f64 = decisions.iter().map(cost_of).sum();
        let urgent: Vec<&Decision> = decisions
            .iter()
            .filter(|d| d.priority == Priority::Alta && d.order_quantity > 0)
            .collect();
        let stockout_risk_value: f64 = urgent.iter().map(|d| cost_of(*d)).sum();
        let skus_at_risk = urgent
            .iter()
            .map(|d| d.sku.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            inventory_on_hand,
            purchase_cost,
            stockout_risk_value,
            skus_at_risk,
        }
    }
}

/// Coverage classification of one SKU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Overstock,
    StockoutRisk,
    Optimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageEntry {
    pub sku: String,
    pub balance: f64,
    pub predicted: f64,
    /// Days the balance lasts at the forecast rate, 0 when nothing is forecast
    pub coverage_days: f64,
    pub status: CoverageStatus,
}

/// Days-of-coverage analysis of a plan
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CoverageReport {
    pub entries: Vec<CoverageEntry>,
}

impl CoverageReport {
    pub fn compute(decisions: &[Decision]) -> Self {
        let entries = decisions
            .iter()
            .map(|d| {
                let coverage_days = coverage_days(d.balance, d.predicted);
                let status = if coverage_days > OVERSTOCK_DAYS {
                    CoverageStatus::Overstock
                } else if coverage_days < STOCKOUT_DAYS {
                    CoverageStatus::StockoutRisk
                } else {
                    CoverageStatus::Optimal
                };
                CoverageEntry {
                    sku: d.sku.clone(),
                    balance: d.balance,
                    predicted: d.predicted,
                    coverage_days,
                    status,
                }
            })
            .collect();
        Self { entries }
    }

    /// Entries with the given status, most extreme first
    pub fn with_status(&self, status: CoverageStatus) -> Vec<&CoverageEntry> {
        let mut matching: Vec<&CoverageEntry> =
            self.entries.iter().filter(|e| e.status == status).collect();
        match status {
            CoverageStatus::StockoutRisk => {
                matching.sort_by(|a, b| a.coverage_days.total_cmp(&b.coverage_days))
            }
            _ => matching.sort_by(|a, b| b.coverage_days.total_cmp(&a.coverage_days)),
        }
        matching
    }

    pub fn count(&self, status: CoverageStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

/// Days of forecast consumption covered by `balance`
pub fn coverage_days(balance: f64, predicted: f64) -> f64 {
    if predicted > 0.0 {
        balance / predicted * DAYS_PER_MONTH
    } else {
        0.0
    }
}
