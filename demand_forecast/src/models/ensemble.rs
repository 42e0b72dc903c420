//! Ensemble consumption forecaster

use crate::error::{ForecastError, Result};
use crate::features::{FeatureColumn, FeatureMatrix};
use crate::metrics::{evaluate_forecast, ForecastMetrics, TargetSummary};
use crate::models::persistence;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stock_math::{
    BaggedForest, BoostingParams, ForestParams, GradientBoostedTrees, Regressor, StandardScaler,
    TargetTransform, TransformKind,
};
use tracing::{info, warn};

/// Training settings of the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Train on `ln(1 + consumption)` instead of standardized consumption
    pub use_log_transform: bool,
    pub forest_trees: usize,
    pub forest_max_depth: usize,
    pub boosting_stages: usize,
    pub boosting_max_depth: usize,
    pub learning_rate: f64,
    /// Seed of the train/test shuffle and the forest bootstrap
    pub seed: u64,
    /// Below this many rows the whole matrix is used for training and evaluation
    pub small_data_threshold: usize,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            use_log_transform: true,
            forest_trees: 100,
            forest_max_depth: 10,
            boosting_stages: 100,
            boosting_max_depth: 6,
            learning_rate: 0.1,
            seed: 42,
            small_data_threshold: 10,
            test_fraction: 0.2,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.forest_trees == 0 || self.boosting_stages == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forest trees and boosting stages must be positive".to_string(),
            ));
        }
        if self.forest_max_depth == 0 || self.boosting_max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "Tree depths must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Learning rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Test fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }

    fn transform_kind(&self) -> TransformKind {
        if self.use_log_transform {
            TransformKind::Log1p
        } else {
            TransformKind::Standardize
        }
    }

    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.forest_trees,
            max_depth: self.forest_max_depth,
            seed: self.seed,
        }
    }

    fn boosting_params(&self) -> BoostingParams {
        BoostingParams {
            n_stages: self.boosting_stages,
            max_depth: self.boosting_max_depth,
            learning_rate: self.learning_rate,
        }
    }
}

/// Everything a trained forecaster needs to predict
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifact {
    pub(crate) forest: BaggedForest,
    pub(crate) booster: GradientBoostedTrees,
    pub(crate) feature_scaler: StandardScaler,
    pub(crate) target_transform: TargetTransform,
    pub(crate) feature_columns: Vec<FeatureColumn>,
}

impl TrainedArtifact {
    /// Feature columns the scaler and models expect, in order
    pub fn feature_columns(&self) -> &[FeatureColumn] {
        &self.feature_columns
    }

    pub fn uses_log_transform(&self) -> bool {
        self.target_transform.kind() == TransformKind::Log1p
    }

    pub fn target_transform(&self) -> &TargetTransform {
        &self.target_transform
    }

    /// Averaged model output in the transformed target scale
    fn predict_transformed(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let scaled = self.feature_scaler.transform(rows)?;
        Ok(self
            .forest
            .predict(&scaled)
            .into_iter()
            .zip(self.booster.predict(&scaled))
            .map(|(forest, booster)| (forest + booster) / 2.0)
            .collect())
    }

    /// Predicted consumption in original units
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let transformed = self.predict_transformed(rows)?;
        Ok(self.target_transform.invert_all(&transformed))
    }
}

/// How the reported metrics were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    /// On rows held out from training
    HeldOut,
    /// On the training rows themselves; not a meaningful accuracy estimate
    InSample,
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluation: EvaluationKind,
    pub metrics: ForecastMetrics,
    /// Consumption distribution of all rows
    pub target: TargetSummary,
    /// Distribution of the transformed training target
    pub transformed_target: TargetSummary,
}

impl TrainingReport {
    /// Whether the metrics estimate out-of-sample accuracy
    pub fn is_meaningful(&self) -> bool {
        self.evaluation == EvaluationKind::HeldOut
    }
}

/// Consumption forecaster: untrained until `train` or `load` succeeds
#[derive(Debug, Clone, Default)]
pub struct EnsembleForecaster {
    config: EnsembleConfig,
    artifact: Option<TrainedArtifact>,
}

impl EnsembleForecaster {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            config,
            artifact: None,
        }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&TrainedArtifact> {
        self.artifact.as_ref()
    }

    /// Fit both models on the feature matrix, replacing any previous fit
    pub fn train(&mut self, matrix: &FeatureMatrix) -> Result<TrainingReport> {
        if matrix.is_empty() {
            return Err(ForecastError::InsufficientData(
                "No rows to train on".to_string(),
            ));
        }
        self.config.validate()?;

        let features = matrix.design_matrix();
        let targets = matrix.targets();
        let target = TargetSummary::from_values(&targets)?;
        info!(
            mean = target.mean,
            std = target.std_dev,
            min = target.min,
            max = target.max,
            p95 = target.p95,
            "consumption target statistics"
        );

        let (train_idx, test_idx, evaluation) = self.split(matrix.len());
        if evaluation == EvaluationKind::InSample {
            warn!(
                rows = matrix.len(),
                "too few rows to hold out, evaluating on training data"
            );
        }

        let pick_rows = |idx: &[usize]| -> Vec<Vec<f64>> {
            idx.iter().map(|&i| features[i].clone()).collect()
        };
        let pick_targets = |idx: &[usize]| -> Vec<f64> { idx.iter().map(|&i| targets[i]).collect() };

        let x_train = pick_rows(&train_idx);
        let y_train = pick_targets(&train_idx);
        let x_test = pick_rows(&test_idx);
        let y_test = pick_targets(&test_idx);

        let target_transform = TargetTransform::fit(self.config.transform_kind(), &y_train)?;
        let y_train_transformed = target_transform.apply_all(&y_train);
        let transformed_target = TargetSummary::from_values(&y_train_transformed)?;
        info!(
            kind = ?target_transform.kind(),
            mean = transformed_target.mean,
            std = transformed_target.std_dev,
            min = transformed_target.min,
            max = transformed_target.max,
            "transformed target statistics"
        );

        let feature_scaler = StandardScaler::fit(&x_train)?;
        let x_train_scaled = feature_scaler.transform(&x_train)?;

        let forest = BaggedForest::fit(
            &x_train_scaled,
            &y_train_transformed,
            self.config.forest_params(),
        )?;
        let booster = GradientBoostedTrees::fit(
            &x_train_scaled,
            &y_train_transformed,
            self.config.boosting_params(),
        )?;

        let artifact = TrainedArtifact {
            forest,
            booster,
            feature_scaler,
            target_transform,
            feature_columns: matrix.columns().to_vec(),
        };

        let predicted = artifact.predict_rows(&x_test)?;
        let metrics = evaluate_forecast(&y_test, &predicted)?;
        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            mape = ?metrics.mape,
            within_20pct = ?metrics.within_tolerance,
            max_error = metrics.max_error,
            p95_error = metrics.p95_error,
            large_errors = metrics.large_errors,
            evaluation = ?evaluation,
            "ensemble evaluation"
        );

        self.artifact = Some(artifact);

        Ok(TrainingReport {
            rows: matrix.len(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            evaluation,
            metrics,
            target,
            transformed_target,
        })
    }

    /// Predicted consumption, one value per matrix row
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        let artifact = self.artifact.as_ref().ok_or_else(|| {
            ForecastError::ModelNotTrained("train or load a model before predicting".to_string())
        })?;

        if matrix.columns() != artifact.feature_columns() {
            return Err(ForecastError::MalformedInput(format!(
                "Feature columns {:?} differ from the trained columns {:?}",
                matrix.column_names(),
                artifact
                    .feature_columns()
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
            )));
        }
        if matrix.is_empty() {
            return Ok(Vec::new());
        }

        artifact.predict_rows(&matrix.design_matrix())
    }

    /// Write the trained artifact to `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let artifact = self.artifact.as_ref().ok_or_else(|| {
            ForecastError::ModelNotTrained("nothing to save before training".to_string())
        })?;
        persistence::save_artifact(artifact, dir.as_ref())
    }

    /// Replace the trained state with the one stored in `dir`
    ///
    /// Returns `Ok(false)` when the directory holds no model, so the caller
    /// can fall back to training.
    pub fn load<P: AsRef<Path>>(&mut self, dir: P) -> Result<bool> {
        match persistence::load_artifact(dir.as_ref())? {
            Some(artifact) => {
                self.config.use_log_transform = artifact.uses_log_transform();
                self.artifact = Some(artifact);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>, EvaluationKind) {
        let all: Vec<usize> = (0..n).collect();
        if n < self.config.small_data_threshold.max(2) {
            return (all.clone(), all, EvaluationKind::InSample);
        }

        let mut permutation = all;
        permutation.shuffle(&mut StdRng::seed_from_u64(self.config.seed));
        let n_test = ((n as f64 * self.config.test_fraction).ceil() as usize).clamp(1, n - 1);
        let test = permutation[..n_test].to_vec();
        let train = permutation[n_test..].to_vec();
        (train, test, EvaluationKind::HeldOut)
    }
}
