//! Model directory layout
//!
//! A trained forecaster is stored as five JSON files:
//!
//! | file                   | content                                   |
//! |------------------------|-------------------------------------------|
//! | `ensemble.json`        | forest and boosted trees                  |
//! | `feature_scaler.json`  | per-feature mean and scale                |
//! | `target_scaler.json`   | target scaler, `null` under log transform |
//! | `feature_columns.json` | ordered feature names                     |
//! | `config.json`          | `{ "use_log_transform": bool }`           |
//!
//! A directory with none of the files holds no model. A directory with only
//! some of them is corrupt and is rejected rather than half-loaded.

use crate::error::{ForecastError, Result};
use crate::features::FeatureColumn;
use crate::models::TrainedArtifact;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use stock_math::{BaggedForest, GradientBoostedTrees, StandardScaler, TargetScaler, TargetTransform};
use tracing::info;

pub const ENSEMBLE_FILE: &str = "ensemble.json";
pub const FEATURE_SCALER_FILE: &str = "feature_scaler.json";
pub const TARGET_SCALER_FILE: &str = "target_scaler.json";
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";
pub const CONFIG_FILE: &str = "config.json";

/// Every file of a complete model directory
pub const ARTIFACT_FILES: [&str; 5] = [
    ENSEMBLE_FILE,
    FEATURE_SCALER_FILE,
    TARGET_SCALER_FILE,
    FEATURE_COLUMNS_FILE,
    CONFIG_FILE,
];

#[derive(Serialize)]
struct EnsembleRef<'a> {
    forest: &'a BaggedForest,
    booster: &'a GradientBoostedTrees,
}

#[derive(Deserialize)]
struct EnsembleOwned {
    forest: BaggedForest,
    booster: GradientBoostedTrees,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelSettings {
    use_log_transform: bool,
}

/// Write every artifact file into `dir`, creating it if needed
pub fn save_artifact(artifact: &TrainedArtifact, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;

    write_json(
        &dir.join(ENSEMBLE_FILE),
        &EnsembleRef {
            forest: &artifact.forest,
            booster: &artifact.booster,
        },
    )?;
    write_json(&dir.join(FEATURE_SCALER_FILE), &artifact.feature_scaler)?;
    write_json(
        &dir.join(TARGET_SCALER_FILE),
        &artifact.target_transform.scaler(),
    )?;
    let names: Vec<&str> = artifact.feature_columns.iter().map(|c| c.name()).collect();
    write_json(&dir.join(FEATURE_COLUMNS_FILE), &names)?;
    write_json(
        &dir.join(CONFIG_FILE),
        &ModelSettings {
            use_log_transform: artifact.uses_log_transform(),
        },
    )?;

    info!(dir = %dir.display(), "model saved");
    Ok(())
}

/// Number of artifact files present in `dir`
pub fn present_files(dir: &Path) -> usize {
    ARTIFACT_FILES
        .iter()
        .filter(|name| dir.join(name).is_file())
        .count()
}

/// Read a model directory
///
/// `Ok(None)` when no artifact file exists; `ModelNotTrained` when the set
/// is incomplete or inconsistent.
pub fn load_artifact(dir: &Path) -> Result<Option<TrainedArtifact>> {
    match present_files(dir) {
        0 => {
            info!(dir = %dir.display(), "no saved model");
            return Ok(None);
        }
        n if n < ARTIFACT_FILES.len() => {
            return Err(ForecastError::ModelNotTrained(format!(
                "model directory {} is incomplete ({} of {} files)",
                dir.display(),
                n,
                ARTIFACT_FILES.len()
            )));
        }
        _ => {}
    }

    let ensemble: EnsembleOwned = read_artifact_file(dir, ENSEMBLE_FILE)?;
    let feature_scaler: StandardScaler = read_artifact_file(dir, FEATURE_SCALER_FILE)?;
    let target_scaler: Option<TargetScaler> = read_artifact_file(dir, TARGET_SCALER_FILE)?;
    let names: Vec<String> = read_artifact_file(dir, FEATURE_COLUMNS_FILE)?;
    let settings: ModelSettings = read_artifact_file(dir, CONFIG_FILE)?;

    let feature_columns = names
        .iter()
        .map(|name| {
            FeatureColumn::from_name(name).ok_or_else(|| {
                ForecastError::ModelNotTrained(format!("unknown feature column '{}'", name))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if feature_scaler.width() != feature_columns.len() {
        return Err(ForecastError::ModelNotTrained(format!(
            "feature scaler expects {} columns, model lists {}",
            feature_scaler.width(),
            feature_columns.len()
        )));
    }

    let width = feature_scaler.width();
    if ensemble.forest.n_features() != Some(width)
        || ensemble.booster.n_features() != Some(width)
    {
        return Err(ForecastError::ModelNotTrained(format!(
            "ensemble trees do not match the {} stored feature columns",
            width
        )));
    }

    let target_transform = match (settings.use_log_transform, target_scaler) {
        (true, _) => TargetTransform::Log1p,
        (false, Some(scaler)) => TargetTransform::Standardize(scaler),
        (false, None) => {
            return Err(ForecastError::ModelNotTrained(
                "standardized target without a stored target scaler".to_string(),
            ))
        }
    };

    info!(
        dir = %dir.display(),
        features = feature_columns.len(),
        log_transform = settings.use_log_transform,
        "model loaded"
    );

    Ok(Some(TrainedArtifact {
        forest: ensemble.forest,
        booster: ensemble.booster,
        feature_scaler,
        target_transform,
        feature_columns,
    }))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// A present but unreadable file means the set is corrupt, not a plain io error
fn read_artifact_file<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
    read_json(&dir.join(name))
        .map_err(|e| ForecastError::ModelNotTrained(format!("cannot read {}: {}", name, e)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
