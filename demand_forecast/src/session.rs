//! Planning session state
//!
//! A [`PlanningSession`] owns what an interactive front end keeps between
//! user actions: the loaded transaction table, the forecaster handle and the
//! last plan. The pipeline functions themselves stay stateless.

use crate::aggregate::aggregate_monthly;
use crate::config::EngineConfig;
use crate::data::{DataLoader, TransactionTable};
use crate::error::{ForecastError, Result};
use crate::features::build_features;
use crate::finance::{CoverageReport, FinancialSummary};
use crate::horizon::{aggregate_horizon, Horizon, HorizonDecision};
use crate::models::{EnsembleForecaster, TrainingReport};
use crate::policy::{plan, Decision};
use std::path::Path;
use tracing::{info, warn};

/// Everything one run produces
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// One decision per feature row
    pub monthly: Vec<Decision>,
    /// One decision per SKU, from its most recent month
    pub latest: Vec<Decision>,
    pub quarterly: Vec<HorizonDecision>,
    pub annual: Vec<HorizonDecision>,
    /// Present when the run trained a new model
    pub training: Option<TrainingReport>,
    pub finance: FinancialSummary,
    pub coverage: CoverageReport,
}

impl PlanOutcome {
    /// Horizon table; `None` for the monthly horizon, which is `latest`
    pub fn horizon(&self, horizon: Horizon) -> Option<&[HorizonDecision]> {
        match horizon {
            Horizon::Monthly => None,
            Horizon::Quarterly => Some(&self.quarterly),
            Horizon::Annual => Some(&self.annual),
        }
    }
}

/// Application state of a planning front end
#[derive(Debug)]
pub struct PlanningSession {
    config: EngineConfig,
    transactions: Option<TransactionTable>,
    forecaster: EnsembleForecaster,
    last_outcome: Option<PlanOutcome>,
}

impl PlanningSession {
    pub fn new(config: EngineConfig) -> Self {
        let forecaster = EnsembleForecaster::new(config.model.clone());
        Self {
            config,
            transactions: None,
            forecaster,
            last_outcome: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load the transaction table from a CSV file, replacing any previous one
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<&TransactionTable> {
        let table = DataLoader::from_csv(path, &self.config.columns)?;
        Ok(self.transactions.insert(table))
    }

    pub fn set_transactions(&mut self, table: TransactionTable) {
        self.transactions = Some(table);
    }

    pub fn transactions(&self) -> Option<&TransactionTable> {
        self.transactions.as_ref()
    }

    pub fn forecaster(&self) -> &EnsembleForecaster {
        &self.forecaster
    }

    pub fn last_outcome(&self) -> Option<&PlanOutcome> {
        self.last_outcome.as_ref()
    }

    /// Aggregate, build features, get a model and plan every horizon
    ///
    /// The model comes from memory, then from the model directory; otherwise
    /// (or with `retrain`) a new one is trained and saved.
    pub fn run(&mut self, retrain: bool) -> Result<&PlanOutcome> {
        let transactions = self.transactions.as_ref().ok_or_else(|| {
            ForecastError::InsufficientData("no transaction table loaded".to_string())
        })?;

        let monthly = aggregate_monthly(transactions, &self.config.aggregation);
        if monthly.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no SKU has enough monthly history".to_string(),
            ));
        }
        let features = build_features(&monthly)?;
        if features.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no SKU has enough history for lag features".to_string(),
            ));
        }

        let model_dir = self.config.model_dir.as_path();
        let mut training = None;
        let need_training = if retrain {
            true
        } else if self.forecaster.is_trained() {
            false
        } else {
            match self.forecaster.load(model_dir) {
                Ok(loaded) => !loaded,
                Err(err) => {
                    warn!(error = %err, dir = %model_dir.display(), "saved model unusable, retraining");
                    true
                }
            }
        };

        if need_training {
            info!(rows = features.len(), skus = features.sku_count(), "training model");
            training = Some(self.forecaster.train(&features)?);
            self.forecaster.save(model_dir)?;
        }

        let policy = &self.config.policy;
        let monthly_plan = plan(&self.forecaster, &features, policy)?;
        let latest = plan(&self.forecaster, &features.latest_per_sku(), policy)?;
        let quarterly = aggregate_horizon(&self.forecaster, &features, policy, Horizon::Quarterly);
        let annual = aggregate_horizon(&self.forecaster, &features, policy, Horizon::Annual);

        let outcome = PlanOutcome {
            finance: FinancialSummary::compute(transactions, &latest),
            coverage: CoverageReport::compute(&latest),
            monthly: monthly_plan,
            latest,
            quarterly,
            annual,
            training,
        };
        Ok(self.last_outcome.insert(outcome))
    }
}
