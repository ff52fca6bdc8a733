//! Bagged regression trees

use super::tree::{RegressionTree, TreeParams};
use super::{check_inputs, FeatureRow, FitError, FittedRegressor, Regressor};
use crate::config::ModelConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random forest model
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Name of the model
    name: String,
    /// Number of trees
    n_estimators: usize,
    /// Seed for bootstrap sampling
    seed: u64,
    /// Per-tree growth limits
    tree: TreeParams,
}

/// Trained random forest model
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Create a forest of fully grown trees
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            name: format!("Random Forest (n_estimators={})", config.n_estimators),
            n_estimators: config.n_estimators,
            seed: config.seed,
            tree: TreeParams::default(),
        }
    }
}

impl Regressor for RandomForest {
    type Fitted = FittedForest;

    fn fit(&self, rows: &[FeatureRow], target: &[f64]) -> Result<FittedForest, FitError> {
        check_inputs(rows, target)?;

        // Leaves average the targets of the rows that reach them.
        let grad: Vec<f64> = target.iter().map(|y| -y).collect();
        let hess = vec![1.0; rows.len()];

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = rows.len();
        let mut trees = Vec::with_capacity(self.n_estimators);
        for round in 1..=self.n_estimators.max(1) {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let tree = RegressionTree::fit(rows, &grad, &hess, &sample, &self.tree);
            if rows.iter().any(|row| !tree.predict(row).is_finite()) {
                return Err(FitError::NonFinite { round });
            }
            trees.push(tree);
        }

        Ok(FittedForest { trees })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedForest {
    /// Number of trees in the forest
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl FittedRegressor for FittedForest {
    fn predict_row(&self, row: &FeatureRow) -> f64 {
        self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forest_predicts_within_target_range() {
        let rows: Vec<FeatureRow> = (0..50).map(|i| [i as f64, (i % 7) as f64, 0.0, 0.0]).collect();
        let target: Vec<f64> = (0..50).map(|i| 2.0 * i as f64 + 3.0).collect();

        let fitted = RandomForest::new(&ModelConfig::default()).fit(&rows, &target).unwrap();
        assert_eq!(fitted.n_trees(), 100);

        for p in fitted.predict(&[[0.0, 0.0, 0.0, 0.0], [1000.0, 3.0, 0.0, 0.0]]) {
            assert!((3.0..=101.0).contains(&p));
        }
        let mid = fitted.predict_row(&[25.0, 4.0, 0.0, 0.0]);
        assert!((mid - 53.0).abs() < 5.0, "got {}", mid);
    }

    #[test]
    fn test_forest_is_seed_deterministic() {
        let rows: Vec<FeatureRow> = (0..30).map(|i| [i as f64, 0.0, 0.0, 0.0]).collect();
        let target: Vec<f64> = (0..30).map(|i| ((i * 37) % 11) as f64).collect();
        let model = RandomForest::new(&ModelConfig::default());
        let a = model.fit(&rows, &target).unwrap().predict(&rows);
        let b = model.fit(&rows, &target).unwrap().predict(&rows);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_row_forest() {
        let fitted = RandomForest::new(&ModelConfig::default())
            .fit(&[[1.0, 2.0, 3.0, 4.0]], &[9.5])
            .unwrap();
        assert_eq!(fitted.predict_row(&[0.0; 4]), 9.5);
    }
}
