//! Gradient-boosted regression trees with squared-error loss

use super::tree::{RegressionTree, TreeParams};
use super::{check_inputs, FeatureRow, FitError, FittedRegressor, ModelKind, Regressor};
use crate::config::ModelConfig;
use statrs::statistics::Statistics;

/// Gradient boosting model
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    /// Name of the model
    name: String,
    /// Family this booster stands for
    kind: ModelKind,
    /// Number of boosting rounds
    n_estimators: usize,
    /// Shrinkage applied to every tree
    learning_rate: f64,
    /// Per-tree growth limits
    tree: TreeParams,
}

/// Trained gradient boosting model
#[derive(Debug, Clone)]
pub struct FittedBoosting {
    /// Initial prediction (target mean)
    base_score: f64,
    /// Shrinkage applied to every tree
    learning_rate: f64,
    /// Fitted trees, in boosting order
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    /// Depth-limited trees with L2-regularized leaves
    pub fn level_wise(config: &ModelConfig) -> Self {
        Self {
            name: format!(
                "Gradient Boosting, level-wise (n_estimators={}, learning_rate={})",
                config.n_estimators, config.learning_rate
            ),
            kind: ModelKind::XgBoost,
            n_estimators: config.n_estimators,
            learning_rate: config.learning_rate,
            tree: TreeParams {
                max_depth: Some(6),
                max_leaves: None,
                min_samples_leaf: 1,
                min_child_weight: 1.0,
                lambda: 1.0,
            },
        }
    }

    /// Leaf-budgeted trees grown best-first
    pub fn leaf_wise(config: &ModelConfig) -> Self {
        Self {
            name: format!(
                "Gradient Boosting, leaf-wise (n_estimators={}, learning_rate={})",
                config.n_estimators, config.learning_rate
            ),
            kind: ModelKind::LightGbm,
            n_estimators: config.n_estimators,
            learning_rate: config.learning_rate,
            tree: TreeParams {
                max_depth: None,
                max_leaves: Some(31),
                min_samples_leaf: 20,
                min_child_weight: 1e-3,
                lambda: 0.0,
            },
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}

impl Regressor for GradientBoosting {
    type Fitted = FittedBoosting;

    fn fit(&self, rows: &[FeatureRow], target: &[f64]) -> Result<FittedBoosting, FitError> {
        check_inputs(rows, target)?;

        let base_score = target.iter().mean();
        if !base_score.is_finite() {
            return Err(FitError::NonFinite { round: 0 });
        }

        let sample: Vec<usize> = (0..rows.len()).collect();
        let hess = vec![1.0; rows.len()];
        let mut predictions = vec![base_score; rows.len()];
        let mut trees = Vec::with_capacity(self.n_estimators);

        for round in 1..=self.n_estimators {
            let grad: Vec<f64> = predictions
                .iter()
                .zip(target)
                .map(|(prediction, actual)| prediction - actual)
                .collect();

            let tree = RegressionTree::fit(rows, &grad, &hess, &sample, &self.tree);
            for (prediction, row) in predictions.iter_mut().zip(rows) {
                *prediction += self.learning_rate * tree.predict(row);
            }
            if predictions.iter().any(|p| !p.is_finite()) {
                return Err(FitError::NonFinite { round });
            }
            trees.push(tree);
        }

        Ok(FittedBoosting {
            base_score,
            learning_rate: self.learning_rate,
            trees,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedBoosting {
    /// Number of boosting rounds kept
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl FittedRegressor for FittedBoosting {
    fn predict_row(&self, row: &FeatureRow) -> f64 {
        self.base_score
            + self.learning_rate * self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>()
    }
}
