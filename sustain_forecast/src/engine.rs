//! Forecast engine: trains a regressor on request and projects it forward
//!
//! Every model is fitted on the fixed feature set [`FEATURE_COLUMNS`]. Future
//! rows hold the latest observed energy use and calendar features advanced
//! from the last observation, so a forecast is a projection of the seasonal
//! and trend structure the model has learned.

use crate::config::{defaults, ForecastConfig, ModelConfig};
use crate::error::{ForecastError, Result};
use crate::features::PreparedDataset;
use crate::models::{
    FeatureRow, FitError, FittedModel, FittedRegressor, Model, ModelKind, Regressor, FEATURE_COUNT,
};
use crate::schema;
use crate::utils::{forecast_accuracy, train_test_split, ForecastAccuracy};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Model inputs, in [`FeatureRow`] order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    schema::ENERGY,
    schema::ELAPSED_DAYS,
    schema::MONTH,
    schema::DAY_OF_YEAR,
];

/// Month `offset` days after `last_month`, counting 30 days per month
pub fn future_month(last_month: u32, offset: u32) -> u32 {
    ((u64::from(last_month.max(1)) - 1 + u64::from(offset / 30)) % 12) as u32 + 1
}

/// Day of year `offset` days after `last_day_of_year`, on a 365-day cycle
pub fn future_day_of_year(last_day_of_year: u32, offset: u32) -> u32 {
    ((u64::from(last_day_of_year.max(1)) - 1 + u64::from(offset)) % 365) as u32 + 1
}

/// Offsets sampled for a trajectory: 0 to `horizon` inclusive, stride `max(1, horizon / 15)`
pub fn trajectory_offsets(horizon_days: u32) -> Vec<u32> {
    let step = (horizon_days / 15).max(1) as usize;
    (0..=horizon_days).step_by(step).collect()
}

/// Last observation the future feature rows are built from
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAnchor {
    pub energy: f64,
    pub max_elapsed_days: i64,
    pub last_month: u32,
    pub last_day_of_year: u32,
    pub last_timestamp: NaiveDateTime,
}

impl FeatureAnchor {
    pub fn from_dataset(data: &PreparedDataset) -> Result<Self> {
        let insufficient = || ForecastError::InsufficientTrainingData(schema::ENERGY.to_string());
        Ok(Self {
            energy: data.latest_value(schema::ENERGY).ok_or_else(insufficient)?,
            max_elapsed_days: data.elapsed_days().iter().copied().max().ok_or_else(insufficient)?,
            last_month: *data.months().last().ok_or_else(insufficient)?,
            last_day_of_year: *data.days_of_year().last().ok_or_else(insufficient)?,
            last_timestamp: data.last_timestamp().ok_or_else(insufficient)?,
        })
    }

    /// Feature row `offset` days after the anchor
    pub fn row_at(&self, offset: u32) -> FeatureRow {
        [
            self.energy,
            (self.max_elapsed_days + i64::from(offset)) as f64,
            f64::from(future_month(self.last_month, offset)),
            f64::from(future_day_of_year(self.last_day_of_year, offset)),
        ]
    }
}

/// One sample of a forecast trajectory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub days_ahead: u32,
    pub prediction: f64,
}

/// One day of a dated forecast path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedPrediction {
    pub date: NaiveDateTime,
    pub prediction: f64,
    pub days_ahead: u32,
}

/// Result of a single-model forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub metric: String,
    pub horizon_days: u32,
    pub requested_model: ModelKind,
    pub used_model: ModelKind,
    /// Prediction at the horizon
    pub prediction: f64,
    /// Latest observed value of the metric
    pub current_value: f64,
    pub trajectory: Vec<TrajectoryPoint>,
    /// Hold-out accuracy, when a hold-out exists
    pub accuracy: Option<ForecastAccuracy>,
}

impl ForecastOutcome {
    pub fn substituted(&self) -> bool {
        self.requested_model != self.used_model
    }
}

/// A model fitted for one metric, ready to predict future days
#[derive(Debug, Clone)]
pub struct TrainedForecaster {
    metric: String,
    requested_model: ModelKind,
    used_model: ModelKind,
    model: FittedModel,
    anchor: FeatureAnchor,
    /// Presentation scale; the score is reported as a percentage
    scale: f64,
    accuracy: Option<ForecastAccuracy>,
}

impl TrainedForecaster {
    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn requested_model(&self) -> ModelKind {
        self.requested_model
    }

    pub fn used_model(&self) -> ModelKind {
        self.used_model
    }

    /// Whether the fallback stood in for the requested family
    pub fn substituted(&self) -> bool {
        self.requested_model != self.used_model
    }

    pub fn accuracy(&self) -> Option<&ForecastAccuracy> {
        self.accuracy.as_ref()
    }

    pub fn anchor(&self) -> &FeatureAnchor {
        &self.anchor
    }

    /// Scaled prediction `offset` days after the last observation
    pub fn predict_at(&self, offset: u32) -> f64 {
        self.model.predict_row(&self.anchor.row_at(offset)) * self.scale
    }

    pub fn trajectory(&self, horizon_days: u32) -> Vec<TrajectoryPoint> {
        trajectory_offsets(horizon_days)
            .into_iter()
            .map(|days_ahead| TrajectoryPoint {
                days_ahead,
                prediction: self.predict_at(days_ahead),
            })
            .collect()
    }

    /// One prediction per day for days `1..=horizon_days`
    pub fn daily_path(&self, horizon_days: u32) -> Result<Vec<DatedPrediction>> {
        (1..=horizon_days)
            .map(|days_ahead| {
                let date = self
                    .anchor
                    .last_timestamp
                    .checked_add_signed(Duration::days(i64::from(days_ahead)))
                    .ok_or_else(|| {
                        ForecastError::InvalidHorizon(format!(
                            "{} days ahead is past the supported calendar",
                            days_ahead
                        ))
                    })?;
                Ok(DatedPrediction {
                    date,
                    prediction: self.predict_at(days_ahead),
                    days_ahead,
                })
            })
            .collect()
    }
}

/// Trains models and produces forecasts
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    models: ModelConfig,
    limits: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(models: ModelConfig, limits: ForecastConfig) -> Self {
        Self { models, limits }
    }

    pub fn limits(&self) -> &ForecastConfig {
        &self.limits
    }

    /// Fit `kind` for `metric`, substituting the fallback family when it cannot be fitted
    pub fn train(&self, data: &PreparedDataset, metric: &str, kind: ModelKind) -> Result<TrainedForecaster> {
        if !data.has_column(metric) {
            return Err(ForecastError::MetricNotInDataset(metric.to_string()));
        }
        let target_column = data.column(metric).ok_or_else(|| {
            ForecastError::InvalidParameter(format!("Column '{}' is not numeric", metric))
        })?;

        let mut feature_columns = Vec::with_capacity(FEATURE_COUNT);
        for name in FEATURE_COLUMNS {
            feature_columns.push(
                data.column(name)
                    .ok_or_else(|| ForecastError::MetricNotInDataset(name.to_string()))?,
            );
        }

        let mut rows: Vec<FeatureRow> = Vec::new();
        let mut target: Vec<f64> = Vec::new();
        for (i, value) in target_column.iter().enumerate() {
            let Some(y) = value else { continue };
            let mut row = [0.0; FEATURE_COUNT];
            let complete = feature_columns.iter().zip(row.iter_mut()).all(|(column, slot)| {
                column[i].map(|x| *slot = x).is_some()
            });
            if complete {
                rows.push(row);
                target.push(*y);
            }
        }
        if rows.is_empty() {
            return Err(ForecastError::InsufficientTrainingData(metric.to_string()));
        }

        let (train_idx, test_idx) = train_test_split(rows.len(), self.models.test_ratio, self.models.seed);
        let train_rows: Vec<FeatureRow> = train_idx.iter().map(|&i| rows[i]).collect();
        let train_target: Vec<f64> = train_idx.iter().map(|&i| target[i]).collect();

        let (model, used_model) = self.fit_with_fallback(kind, &train_rows, &train_target)?;

        let accuracy = if test_idx.is_empty() {
            None
        } else {
            let test_rows: Vec<FeatureRow> = test_idx.iter().map(|&i| rows[i]).collect();
            let actual: Vec<f64> = test_idx.iter().map(|&i| target[i]).collect();
            let accuracy = forecast_accuracy(&model.predict(&test_rows), &actual)?;
            tracing::debug!(%metric, model = %used_model, %accuracy, "Hold-out accuracy");
            Some(accuracy)
        };

        tracing::info!(
            %metric,
            requested = %kind,
            used = %used_model,
            train_rows = train_rows.len(),
            holdout_rows = test_idx.len(),
            "Model trained"
        );

        Ok(TrainedForecaster {
            metric: metric.to_string(),
            requested_model: kind,
            used_model,
            model,
            anchor: FeatureAnchor::from_dataset(data)?,
            scale: if metric == schema::SCORE { 100.0 } else { 1.0 },
            accuracy,
        })
    }

    fn fit_with_fallback(
        &self,
        kind: ModelKind,
        rows: &[FeatureRow],
        target: &[f64],
    ) -> Result<(FittedModel, ModelKind)> {
        let attempt = if self.models.is_available(kind) {
            Model::for_kind(kind, &self.models).fit(rows, target)
        } else {
            Err(FitError::Unavailable(kind))
        };

        match attempt {
            Ok(model) => Ok((model, kind)),
            Err(err) if kind != defaults::FALLBACK_MODEL => {
                tracing::warn!(model = %kind, error = %err, fallback = %defaults::FALLBACK_MODEL, "Model fit failed, substituting fallback");
                let fallback = Model::for_kind(defaults::FALLBACK_MODEL, &self.models);
                fallback
                    .fit(rows, target)
                    .map(|model| (model, defaults::FALLBACK_MODEL))
                    .map_err(|err| ForecastError::ModelFit {
                        model: fallback.name().to_string(),
                        reason: err.to_string(),
                    })
            }
            Err(err) => Err(ForecastError::ModelFit {
                model: kind.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Train `kind` on `metric` and forecast `horizon_days` ahead
    pub fn forecast(
        &self,
        data: &PreparedDataset,
        metric: &str,
        horizon_days: u32,
        kind: ModelKind,
    ) -> Result<ForecastOutcome> {
        let horizon_days = self.limits.check_horizon(horizon_days)?;
        let trained = self.train(data, metric, kind)?;
        let current_value = current_value(data, metric)?;

        Ok(ForecastOutcome {
            metric: metric.to_string(),
            horizon_days,
            requested_model: kind,
            used_model: trained.used_model(),
            prediction: trained.predict_at(horizon_days),
            current_value,
            trajectory: trained.trajectory(horizon_days),
            accuracy: trained.accuracy().cloned(),
        })
    }
}

/// Latest non-missing value of `metric`, the score as a percentage
pub fn current_value(data: &PreparedDataset, metric: &str) -> Result<f64> {
    let value = data
        .latest_value(metric)
        .ok_or_else(|| ForecastError::InsufficientTrainingData(metric.to_string()))?;
    Ok(if metric == schema::SCORE { value * 100.0 } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_wraps_after_december() {
        assert_eq!(future_month(12, 0), 12);
        assert_eq!(future_month(12, 30), 1);
        assert_eq!(future_month(12, 90), 3);
        assert_eq!(future_month(11, 30), 12);
        assert_eq!(future_month(1, 29), 1);
    }

    #[test]
    fn test_day_of_year_wraps() {
        assert_eq!(future_day_of_year(365, 0), 365);
        assert_eq!(future_day_of_year(365, 1), 1);
        assert_eq!(future_day_of_year(366, 0), 1);
        assert_eq!(future_day_of_year(100, 730), 100);
    }

    #[test]
    fn test_trajectory_offsets() {
        assert_eq!(trajectory_offsets(1), vec![0, 1]);
        assert_eq!(trajectory_offsets(14), (0..=14).collect::<Vec<_>>());
        let ninety = trajectory_offsets(90);
        assert_eq!(ninety.len(), 16);
        assert_eq!(ninety.last(), Some(&90));
        assert_eq!(trajectory_offsets(100).last(), Some(&96));
    }
}
