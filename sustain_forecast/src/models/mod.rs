//! Regression models used to forecast sustainability metrics
//!
//! Three families sit behind one [`Regressor`] interface:
//!
//! - [`ModelKind::XgBoost`]: gradient-boosted trees grown level by level
//! - [`ModelKind::LightGbm`]: gradient-boosted trees grown leaf by leaf
//! - [`ModelKind::RandomForest`]: bagged regression trees, also the fallback
//!
//! [`Model`] is the sum type the engine works with; it dispatches to the
//! concrete family and produces a [`FittedModel`].

use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod gradient_boosting;
pub mod random_forest;
pub mod tree;

pub use gradient_boosting::{FittedBoosting, GradientBoosting};
pub use random_forest::{FittedForest, RandomForest};

/// Number of input features every model is trained on.
pub const FEATURE_COUNT: usize = 4;

/// One row of model inputs, in `engine::FEATURE_COLUMNS` order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Identifier of a regressor family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "xgboost")]
    XgBoost,
    #[serde(rename = "lightgbm")]
    LightGbm,
    #[serde(rename = "random_forest")]
    RandomForest,
}

impl ModelKind {
    /// All families, in question-parsing precedence order.
    pub const ALL: [ModelKind; 3] = [ModelKind::LightGbm, ModelKind::XgBoost, ModelKind::RandomForest];

    /// Wire identifier, e.g. `"xgboost"`
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::XgBoost => "xgboost",
            ModelKind::LightGbm => "lightgbm",
            ModelKind::RandomForest => "random_forest",
        }
    }

    /// Maps any identifier to a family, unknown ones to the fallback.
    pub fn resolve(name: &str) -> ModelKind {
        name.parse().unwrap_or(crate::config::defaults::FALLBACK_MODEL)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xgboost" => Ok(ModelKind::XgBoost),
            "lightgbm" => Ok(ModelKind::LightGbm),
            "random_forest" | "randomforest" => Ok(ModelKind::RandomForest),
            other => Err(format!("unknown model '{}'", other)),
        }
    }
}

/// Reasons a regressor can refuse to fit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The family is switched off in this deployment
    #[error("{0} is not available")]
    Unavailable(ModelKind),

    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },

    /// Training state stopped being finite
    #[error("non-finite values after round {round}")]
    NonFinite { round: usize },
}

/// A model that can be trained on feature rows
pub trait Regressor: fmt::Debug {
    /// The type of fitted model produced
    type Fitted: FittedRegressor;

    /// Fit the model to `target` given `rows`
    fn fit(&self, rows: &[FeatureRow], target: &[f64]) -> Result<Self::Fitted, FitError>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// A fitted model able to score new rows
pub trait FittedRegressor: fmt::Debug + Send + Sync {
    /// Predict a single row
    fn predict_row(&self, row: &FeatureRow) -> f64;

    /// Predict many rows
    fn predict(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Shared input checks for every family.
pub(crate) fn check_inputs(rows: &[FeatureRow], target: &[f64]) -> Result<(), FitError> {
    if rows.len() != target.len() {
        return Err(FitError::LengthMismatch {
            rows: rows.len(),
            targets: target.len(),
        });
    }
    if rows.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    Ok(())
}

/// Unfitted model of any family
#[derive(Debug, Clone)]
pub enum Model {
    GradientBoostA(GradientBoosting),
    GradientBoostB(GradientBoosting),
    BaggedTrees(RandomForest),
}

impl Model {
    /// Build the model for `kind` from configuration
    pub fn for_kind(kind: ModelKind, config: &ModelConfig) -> Self {
        match kind {
            ModelKind::XgBoost => Model::GradientBoostA(GradientBoosting::level_wise(config)),
            ModelKind::LightGbm => Model::GradientBoostB(GradientBoosting::leaf_wise(config)),
            ModelKind::RandomForest => Model::BaggedTrees(RandomForest::new(config)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::GradientBoostA(_) => ModelKind::XgBoost,
            Model::GradientBoostB(_) => ModelKind::LightGbm,
            Model::BaggedTrees(_) => ModelKind::RandomForest,
        }
    }
}

impl Regressor for Model {
    type Fitted = FittedModel;

    fn fit(&self, rows: &[FeatureRow], target: &[f64]) -> Result<FittedModel, FitError> {
        match self {
            Model::GradientBoostA(model) | Model::GradientBoostB(model) => {
                model.fit(rows, target).map(FittedModel::Boosted)
            }
            Model::BaggedTrees(model) => model.fit(rows, target).map(FittedModel::Forest),
        }
    }

    fn name(&self) -> &str {
        match self {
            Model::GradientBoostA(model) | Model::GradientBoostB(model) => model.name(),
            Model::BaggedTrees(model) => model.name(),
        }
    }
}

/// Fitted model of any family
#[derive(Debug, Clone)]
pub enum FittedModel {
    Boosted(FittedBoosting),
    Forest(FittedForest),
}

impl FittedRegressor for FittedModel {
    fn predict_row(&self, row: &FeatureRow) -> f64 {
        match self {
            FittedModel::Boosted(model) => model.predict_row(row),
            FittedModel::Forest(model) => model.predict_row(row),
        }
    }
}
