//! Transaction table loading
//!
//! The engine consumes a kardex-style log: one row per inventory movement.
//! Only the SKU column is required. Missing optional columns degrade to
//! defaults instead of failing:
//!
//! | column      | when absent                       |
//! |-------------|-----------------------------------|
//! | date        | every row gets a synthetic month  |
//! | type        | rows are untyped                  |
//! | outflow     | fallback column, else zero        |
//! | balance     | zero                              |
//! | unit cost   | unknown                           |
//!
//! Unparseable numeric cells are coerced to zero.

use crate::config::ColumnNames;
use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// One inventory movement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionRow {
    /// SKU identifier; rows without one are not usable
    pub sku: Option<String>,
    /// Raw timestamp text, parsed later
    pub date: Option<String>,
    /// Transaction type
    pub kind: Option<String>,
    /// Outflow quantity
    pub outflow: f64,
    /// Ending balance after the movement
    pub balance: f64,
    /// Average unit cost after the movement
    pub unit_cost: Option<f64>,
}

impl TransactionRow {
    /// Convenience constructor for a dated outflow movement
    pub fn outflow(sku: &str, date: &str, kind: &str, quantity: f64, balance: f64) -> Self {
        Self {
            sku: Some(sku.to_string()),
            date: Some(date.to_string()),
            kind: Some(kind.to_string()),
            outflow: quantity,
            balance,
            unit_cost: None,
        }
    }

    pub fn with_unit_cost(mut self, cost: f64) -> Self {
        self.unit_cost = Some(cost);
        self
    }

    /// SKU with surrounding whitespace removed, `None` when blank
    pub fn sku_key(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Transaction log plus which optional columns it carried
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionTable {
    rows: Vec<TransactionRow>,
    has_dates: bool,
    has_kinds: bool,
    has_balances: bool,
}

impl TransactionTable {
    /// Build a table from rows; optional columns count as present if any row fills them
    pub fn from_rows(rows: Vec<TransactionRow>) -> Self {
        let has_dates = rows.iter().any(|r| r.date.is_some());
        let has_kinds = rows.iter().any(|r| r.kind.is_some());
        Self {
            rows,
            has_dates,
            has_kinds,
            has_balances: true,
        }
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the source had a date column
    pub fn has_dates(&self) -> bool {
        self.has_dates
    }

    /// Whether the source had a transaction-type column
    pub fn has_kinds(&self) -> bool {
        self.has_kinds
    }

    /// Whether the source had an ending-balance column
    pub fn has_balances(&self) -> bool {
        self.has_balances
    }
}

/// Data loader for transaction tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a transaction table from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, columns: &ColumnNames) -> Result<TransactionTable> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            "loaded transaction file"
        );
        Self::from_dataframe(&df, columns)
    }

    /// Create a transaction table from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame, columns: &ColumnNames) -> Result<TransactionTable> {
        let skus = Self::text_column(df, &columns.sku)?.ok_or_else(|| {
            ForecastError::MalformedInput(format!("SKU column '{}' not found", columns.sku))
        })?;
        let height = skus.len();

        let dates = Self::text_column(df, &columns.date)?;
        let kinds = Self::text_column(df, &columns.kind)?;
        let outflows = match Self::numeric_column(df, &columns.outflow)? {
            Some(values) => Some(values),
            None => Self::numeric_column(df, &columns.outflow_fallback)?,
        };
        let balances = Self::numeric_column(df, &columns.balance)?;
        let unit_costs = Self::optional_numeric_column(df, &columns.unit_cost)?;

        debug!(
            has_dates = dates.is_some(),
            has_kinds = kinds.is_some(),
            has_outflow = outflows.is_some(),
            has_balance = balances.is_some(),
            "resolved transaction columns"
        );

        let rows = (0..height)
            .map(|i| TransactionRow {
                sku: skus[i].clone(),
                date: dates.as_ref().and_then(|d| d[i].clone()),
                kind: kinds.as_ref().and_then(|k| k[i].clone()),
                outflow: outflows.as_ref().map_or(0.0, |o| o[i]),
                balance: balances.as_ref().map_or(0.0, |b| b[i]),
                unit_cost: unit_costs.as_ref().and_then(|c| c[i]),
            })
            .collect();

        Ok(TransactionTable {
            rows,
            has_dates: dates.is_some(),
            has_kinds: kinds.is_some(),
            has_balances: balances.is_some(),
        })
    }

    /// Column as trimmed strings, `None` if the column does not exist
    fn text_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
        let Ok(col) = df.column(name) else {
            return Ok(None);
        };
        let text = col.cast(&DataType::Utf8)?;
        let values = text
            .utf8()?
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
            .collect();
        Ok(Some(values))
    }

    /// Column as numbers with unparseable cells coerced to zero
    fn numeric_column(df: &DataFrame, name: &str) -> Result<Option<Vec<f64>>> {
        Ok(Self::optional_numeric_column(df, name)?
            .map(|values| values.into_iter().map(|v| v.unwrap_or(0.0)).collect()))
    }

    /// Column as numbers with unparseable cells kept as `None`
    fn optional_numeric_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        let Ok(col) = df.column(name) else {
            return Ok(None);
        };
        let values: Vec<Option<f64>> = if col.dtype() == &DataType::Utf8 {
            // trim before parsing so " 12 " still counts
            col.utf8()?
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect()
        } else {
            let numbers = col.cast(&DataType::Float64)?;
            let parsed = numbers.f64()?.into_iter().collect();
            parsed
        };
        Ok(Some(
            values
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        ))
    }
}
