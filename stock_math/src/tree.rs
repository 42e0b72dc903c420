//! CART regression tree
//!
//! Greedy binary splits minimizing squared error. Nodes are stored flat,
//! children referenced by index, so a fitted tree serializes as a plain list.

use crate::{validate_design, MathError, Regressor, Result};
use serde::{Deserialize, Serialize};

/// Minimum gain in the split score for a split to be taken
const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Maximum depth, the root being depth 0
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Each side of a split keeps at least this many samples
    pub min_samples_leaf: usize,
}

impl TreeParams {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A node of a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Builder<'a> {
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on all rows
    pub fn fit(features: &[Vec<f64>], targets: &[f64], params: TreeParams) -> Result<Self> {
        let sample: Vec<usize> = (0..features.len()).collect();
        Self::fit_sample(features, targets, &sample, params)
    }

    /// Fit on the given row indices; repeated indices weigh a row more than once
    pub fn fit_sample(
        features: &[Vec<f64>],
        targets: &[f64],
        sample: &[usize],
        params: TreeParams,
    ) -> Result<Self> {
        let n_features = validate_design(features, targets)?;
        if sample.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot grow a tree from an empty sample".to_string(),
            ));
        }
        if let Some(&bad) = sample.iter().find(|&&i| i >= features.len()) {
            return Err(MathError::InvalidInput(format!(
                "Sample index {} out of range for {} rows",
                bad,
                features.len()
            )));
        }

        let mut builder = Builder {
            features,
            targets,
            params,
            nodes: Vec::new(),
        };
        let mut indices = sample.to_vec();
        builder.grow(&mut indices, 0);

        Ok(Self {
            nodes: builder.nodes,
            n_features,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Regressor for RegressionTree {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl Builder<'_> {
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let sum: f64 = indices.iter().map(|&i| self.targets[i]).sum();
        self.nodes.push(Node::Leaf {
            value: sum / indices.len() as f64,
        });

        if depth >= self.params.max_depth || indices.len() < self.params.min_samples_split {
            return id;
        }
        let Some(split) = self.best_split(indices, sum) else {
            return id;
        };

        // false sorts before true: rows going left come first
        indices.sort_by_key(|&i| self.features[i][split.feature] > split.threshold);
        let n_left = indices
            .iter()
            .take_while(|&&i| self.features[i][split.feature] <= split.threshold)
            .count();
        let (left_rows, right_rows) = indices.split_at_mut(n_left);

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Split maximizing `S_l^2 / n_l + S_r^2 / n_r`, the squared-error reduction up to a constant
    fn best_split(&self, indices: &[usize], total: f64) -> Option<Split> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = total * total / n as f64;
        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for feature in 0..self.features[indices[0]].len() {
            order.sort_by(|&a, &b| self.features[a][feature].total_cmp(&self.features[b][feature]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.targets[order[pos]];
                let here = self.features[order[pos]][feature];
                let next = self.features[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if score <= parent_score + MIN_GAIN {
                    continue;
                }
                if best.map_or(true, |b| score > b.score + MIN_GAIN) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let features = (0..10).map(|i| vec![i as f64, 0.0]).collect();
        let targets = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();
        (features, targets)
    }

    #[test]
    fn test_tree_learns_step() {
        let (features, targets) = step_data();
        let tree = RegressionTree::fit(&features, &targets, TreeParams::default()).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_approx_eq!(tree.predict_row(&[2.0, 0.0]), 1.0);
        assert_approx_eq!(tree.predict_row(&[7.0, 0.0]), 9.0);
        assert_approx_eq!(tree.predict_row(&[4.5, 0.0]), 1.0);
        assert_approx_eq!(tree.predict_row(&[4.6, 0.0]), 9.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let tree = RegressionTree::fit(&features, &[4.0, 4.0, 4.0], TreeParams::default()).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_approx_eq!(tree.predict_row(&[100.0]), 4.0);
    }

    #[test]
    fn test_max_depth_is_respected() {
        let features: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..64).map(|i| (i * i) as f64).collect();
        let tree = RegressionTree::fit(&features, &targets, TreeParams::with_max_depth(3)).unwrap();
        assert!(tree.depth() <= 3);
        assert!(tree.n_nodes() <= 15);
    }

    #[test]
    fn test_fit_sample_weighs_repeats() {
        let features = vec![vec![0.0], vec![0.0]];
        let targets = vec![2.0, 8.0];
        let tree =
            RegressionTree::fit_sample(&features, &targets, &[0, 0, 0, 1], TreeParams::default())
                .unwrap();
        assert_approx_eq!(tree.predict_row(&[0.0]), 3.5);
    }

    #[test]
    fn test_fit_sample_out_of_range() {
        let features = vec![vec![0.0]];
        assert!(RegressionTree::fit_sample(&features, &[1.0], &[3], TreeParams::default()).is_err());
    }
}
