//! Question-to-forecast pipeline
//!
//! Every call loads and prepares the dataset afresh and trains its models
//! on demand; nothing is cached between calls.

use crate::config::{defaults, ForecastConfig, Settings};
use crate::data::DataLoader;
use crate::engine::{current_value, ForecastEngine};
use crate::error::{ForecastError, Result};
use crate::features::{prepare, PreparedDataset};
use crate::models::ModelKind;
use crate::query::QuestionParser;
use crate::response::{AvailableMetrics, ForecastReport, ScoreGauge, StructuredForecast};
use crate::schema;
use crate::utils::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-model forecast request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StructuredRequest {
    pub metric: String,
    /// Defaults to the structured horizon
    #[serde(default)]
    pub forecast_days: Option<u32>,
    /// Model identifiers; unknown ones resolve to the fallback family
    #[serde(default)]
    pub models: Option<Vec<String>>,
}

impl StructuredRequest {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            forecast_days: None,
            models: None,
        }
    }
}

/// Entry point tying loader, parser, engine and response assembly together
#[derive(Debug, Clone)]
pub struct Pipeline {
    loader: DataLoader,
    parser: QuestionParser,
    engine: ForecastEngine,
    limits: ForecastConfig,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Self {
        Self {
            loader: DataLoader::new(settings.data.clone()),
            parser: QuestionParser::new(settings.forecast.default_horizon_days),
            engine: ForecastEngine::new(settings.models.clone(), settings.forecast.clone()),
            limits: settings.forecast.clone(),
        }
    }

    /// Load the dataset and derive its features
    pub fn prepared(&self) -> Result<PreparedDataset> {
        let dataset = self.loader.load()?;
        prepare(&dataset)
    }

    /// Answer a natural-language forecast question
    pub fn ask(&self, question: &str) -> Result<ForecastReport> {
        let parsed = self.parser.parse(question)?;
        tracing::info!(
            metric = %parsed.metric,
            horizon_days = parsed.horizon_days,
            model = %parsed.model,
            "Parsed question"
        );

        let data = self.prepared()?;
        let outcome = self
            .engine
            .forecast(&data, &parsed.metric, parsed.horizon_days, parsed.model)?;
        Ok(ForecastReport::from_outcome(&outcome))
    }

    /// Forecast one metric with several models over a daily path
    pub fn forecast(&self, request: &StructuredRequest) -> Result<StructuredForecast> {
        let forecast_days = self
            .limits
            .check_horizon(request.forecast_days.unwrap_or(self.limits.structured_horizon_days))?;
        let model_names: Vec<String> = match &request.models {
            Some(models) if !models.is_empty() => models.clone(),
            _ => defaults::STRUCTURED_MODELS
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
        };

        let data = self.prepared()?;
        let metric = request.metric.as_str();
        if !data.has_column(metric) {
            return Err(ForecastError::MetricNotInDataset(metric.to_string()));
        }

        let mut predictions = BTreeMap::new();
        let mut latest_predictions = BTreeMap::new();
        for name in model_names {
            let trained = self.engine.train(&data, metric, ModelKind::resolve(&name))?;
            let key = if trained.substituted() {
                format!("{}_fallback", name)
            } else {
                name
            };

            let path = trained.daily_path(forecast_days)?;
            if let Some(last) = path.last() {
                latest_predictions.insert(key.clone(), last.prediction);
            }
            predictions.insert(key, path);
        }

        let score = data
            .latest_value(schema::SCORE)
            .ok_or_else(|| ForecastError::DataUnavailable("no row has a sustainability score".to_string()))?;

        Ok(StructuredForecast {
            metric: metric.to_string(),
            forecast_days,
            current_value: round_to(current_value(&data, metric)?, 2),
            sustainability_score: round_to(score * 100.0, 2),
            predictions,
            latest_predictions,
        })
    }

    /// Latest sustainability score as a gauge payload
    pub fn sustainability_score(&self) -> Result<ScoreGauge> {
        let data = self.prepared()?;
        let score = data
            .latest_value(schema::SCORE)
            .ok_or_else(|| ForecastError::DataUnavailable("no row has a sustainability score".to_string()))?;
        Ok(ScoreGauge::new(score * 100.0))
    }

    /// Known metrics present in the loaded dataset; the score is always derivable
    pub fn available_metrics(&self) -> Result<AvailableMetrics> {
        let dataset = self.loader.load()?;
        let metrics = schema::KNOWN_METRICS
            .iter()
            .filter(|metric| **metric == schema::SCORE || dataset.has_column(metric))
            .map(|metric| metric.to_string())
            .collect();
        Ok(AvailableMetrics::new(metrics))
    }
}
