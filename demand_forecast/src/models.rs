//! Demand models
//!
//! The forecaster is an ensemble of a bagging forest and a gradient-boosted
//! regressor trained on a variance-stabilized consumption target. Its trained
//! state can be written to and read back from a model directory.

pub mod ensemble;
pub mod persistence;

pub use ensemble::{
    EnsembleConfig, EnsembleForecaster, EvaluationKind, TrainedArtifact, TrainingReport,
};
