//! # Demand Forecast
//!
//! Monthly consumption forecasting and purchase planning from inventory
//! transaction logs.
//!
//! ## Pipeline
//!
//! - Transaction loading from CSV or an existing polars `DataFrame`
//! - Monthly aggregation per SKU (summed consumption, closing balance)
//! - Feature construction (calendar, whole-history statistics, lags, rolling mean)
//! - An ensemble of a bagging forest and gradient-boosted trees on a
//!   log-transformed (or standardized) consumption target
//! - Model persistence in a directory of JSON artifacts
//! - Replenishment policy: safety stock, order quantity, recommendation, priority
//! - Quarterly and annual plans, financial and coverage summaries, CSV export
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::config::EngineConfig;
//! use demand_forecast::session::PlanningSession;
//!
//! let mut session = PlanningSession::new(EngineConfig::default());
//! session.load_csv("kardex.csv")?;
//!
//! let outcome = session.run(false)?;
//! for decision in &outcome.latest {
//!     println!(
//!         "{}: order {} ({}, {})",
//!         decision.sku, decision.order_quantity, decision.recommendation, decision.priority
//!     );
//! }
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod finance;
pub mod horizon;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{aggregate_monthly, AggregationConfig, ConsumptionRule, MonthlyTable};
pub use crate::config::EngineConfig;
pub use crate::data::{DataLoader, TransactionRow, TransactionTable};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{build_features, FeatureColumn, FeatureMatrix};
pub use crate::horizon::{aggregate_horizon, Horizon, HorizonDecision};
pub use crate::models::{EnsembleConfig, EnsembleForecaster, TrainingReport};
pub use crate::policy::{Decision, Priority, Recommendation, ReplenishmentPolicy};
pub use crate::session::{PlanOutcome, PlanningSession};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
