//! Engine configuration
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! model_dir = "modelo_compras"
//!
//! [columns]
//! sku = "id_insumo"
//!
//! [aggregation]
//! consumption_rule = "typed_outflow"
//!
//! [model]
//! use_log_transform = true
//!
//! [policy]
//! lead_time_days = 30.0
//! service_level = 0.95
//! ```

use crate::aggregate::AggregationConfig;
use crate::error::Result;
use crate::models::EnsembleConfig;
use crate::policy::ReplenishmentPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Column names of the transaction table, fixed by convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// SKU identifier, required
    pub sku: String,
    /// Transaction timestamp
    pub date: String,
    /// Transaction type (`SALIDAS`, `SALDO INICIAL`, ...)
    pub kind: String,
    /// Outflow quantity
    pub outflow: String,
    /// Used when `outflow` is absent
    pub outflow_fallback: String,
    /// Ending balance after the transaction
    pub balance: String,
    /// Average unit cost after the transaction
    pub unit_cost: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            sku: "id_insumo".to_string(),
            date: "fecha".to_string(),
            kind: "tipo".to_string(),
            outflow: "canti salida".to_string(),
            outflow_fallback: "consumo".to_string(),
            balance: "saldo final".to_string(),
            unit_cost: "promedio_fin".to_string(),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub columns: ColumnNames,
    pub aggregation: AggregationConfig,
    pub model: EnsembleConfig,
    pub policy: ReplenishmentPolicy,
    /// Directory holding the persisted model artifacts
    pub model_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            aggregation: AggregationConfig::default(),
            model: EnsembleConfig::default(),
            policy: ReplenishmentPolicy::default(),
            model_dir: PathBuf::from("modelo_compras"),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.aggregation.validate()?;
        self.model.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}
