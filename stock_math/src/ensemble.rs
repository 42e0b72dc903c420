//! Tree ensembles
//!
//! - `BaggedForest`: trees grown on bootstrap resamples, predictions averaged
//! - `GradientBoostedTrees`: trees fitted stage-wise to squared-error residuals
//!
//! The forest is seeded and boosting uses every row at every stage, so
//! refitting on the same data gives the same model.

use crate::tree::{RegressionTree, TreeParams};
use crate::{validate_design, MathError, Regressor, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters of a bagging forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

/// Averaged ensemble of bootstrap-trained regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaggedForest {
    trees: Vec<RegressionTree>,
}

impl BaggedForest {
    pub fn fit(features: &[Vec<f64>], targets: &[f64], params: ForestParams) -> Result<Self> {
        validate_design(features, targets)?;
        if params.n_trees == 0 {
            return Err(MathError::InvalidInput(
                "Forest needs at least one tree".to_string(),
            ));
        }

        let n = features.len();
        let tree_params = TreeParams::with_max_depth(params.max_depth);
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit_sample(features, targets, &sample, tree_params)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Feature width every tree was fitted on
    pub fn n_features(&self) -> Option<usize> {
        common_width(&self.trees)
    }
}

impl Regressor for BaggedForest {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
        total / self.trees.len() as f64
    }
}

/// Parameters of a gradient-boosted regressor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 6,
            learning_rate: 0.1,
        }
    }
}

/// Stage-wise additive model of regression trees under squared loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn fit(features: &[Vec<f64>], targets: &[f64], params: BoostingParams) -> Result<Self> {
        validate_design(features, targets)?;
        if !(params.learning_rate > 0.0 && params.learning_rate <= 1.0) {
            return Err(MathError::InvalidInput(format!(
                "Learning rate must be in (0, 1], got {}",
                params.learning_rate
            )));
        }

        let init = targets.iter().sum::<f64>() / targets.len() as f64;
        let tree_params = TreeParams::with_max_depth(params.max_depth);
        let mut current = vec![init; targets.len()];
        let mut trees = Vec::with_capacity(params.n_stages);

        for _ in 0..params.n_stages {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&current)
                .map(|(y, f)| y - f)
                .collect();
            let tree = RegressionTree::fit(features, &residuals, tree_params)?;

            for (value, row) in current.iter_mut().zip(features) {
                *value += params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }

    /// Feature width every stage was fitted on
    pub fn n_features(&self) -> Option<usize> {
        common_width(&self.trees)
    }
}

/// Common input width of `trees`, `None` when empty or inconsistent
fn common_width(trees: &[RegressionTree]) -> Option<usize> {
    let width = trees.first()?.n_features();
    trees
        .iter()
        .all(|tree| tree.n_features() == width)
        .then_some(width)
}


impl Regressor for GradientBoostedTrees {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict_row(row))
                    .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 4) as f64]).collect();
        let targets = features.iter().map(|r| 2.0 * r[0] + 1.0).collect();
        (features, targets)
    }

    #[test]
    fn test_feature_width() {
        let (features, targets) = linear_data();
        let forest = BaggedForest::fit(&features, &targets, ForestParams::default()).unwrap();
        let booster =
            GradientBoostedTrees::fit(&features, &targets, BoostingParams::default()).unwrap();

        assert_eq!(forest.n_features(), Some(2));
        assert_eq!(booster.n_features(), Some(2));
        assert_eq!(BaggedForest { trees: Vec::new() }.n_features(), None);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (features, targets) = linear_data();
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        let a = BaggedForest::fit(&features, &targets, params).unwrap();
        let b = BaggedForest::fit(&features, &targets, params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn test_forest_tracks_trend() {
        let (features, targets) = linear_data();
        let forest = BaggedForest::fit(&features, &targets, ForestParams::default()).unwrap();
        let low = forest.predict_row(&[2.0, 2.0]);
        let high = forest.predict_row(&[37.0, 1.0]);
        assert!(low < 20.0);
        assert!(high > 60.0);
    }

    #[test]
    fn test_boosting_fits_training_data() {
        let (features, targets) = linear_data();
        let model = GradientBoostedTrees::fit(&features, &targets, BoostingParams::default()).unwrap();
        assert_eq!(model.n_stages(), 100);

        let predictions = model.predict(&features);
        let mae = predictions
            .iter()
            .zip(&targets)
            .map(|(p, y)| (p - y).abs())
            .sum::<f64>()
            / targets.len() as f64;
        assert!(mae < 1.0, "mae was {}", mae);
    }

    #[test]
    fn test_single_row_models_return_the_target() {
        let features = vec![vec![1.0, 2.0]];
        let targets = vec![13.0f64.ln_1p()];
        let forest = BaggedForest::fit(&features, &targets, ForestParams::default()).unwrap();
        let boost = GradientBoostedTrees::fit(&features, &targets, BoostingParams::default()).unwrap();
        assert_approx_eq!(forest.predict_row(&features[0]), targets[0]);
        assert_approx_eq!(boost.predict_row(&features[0]), targets[0]);
    }

    #[test]
    fn test_invalid_learning_rate() {
        let (features, targets) = linear_data();
        let params = BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        };
        assert!(GradientBoostedTrees::fit(&features, &targets, params).is_err());
    }
}
