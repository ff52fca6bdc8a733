//! Response payloads
//!
//! Values are rounded only here, when a payload is assembled: two decimals
//! for values and changes, one for percentages. Trajectories and daily
//! paths are passed through unrounded.

use crate::engine::{DatedPrediction, ForecastOutcome, TrajectoryPoint};
use crate::utils::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Direction of a forecast change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => f.write_str("increase"),
            Direction::Decrease => f.write_str("decrease"),
        }
    }
}

/// Before/after comparison of a forecast against the current value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub change: f64,
    /// Relative change in percent, 0 when the current value is 0
    pub percentage_change: f64,
    /// `Increase` only for a strictly positive change
    pub direction: Direction,
}

impl Comparison {
    pub fn between(current: f64, prediction: f64) -> Self {
        let change = prediction - current;
        let percentage_change = if current == 0.0 {
            0.0
        } else {
            change / current * 100.0
        };
        let direction = if change > 0.0 {
            Direction::Increase
        } else {
            Direction::Decrease
        };
        Self {
            change,
            percentage_change,
            direction,
        }
    }
}

/// Answer to a natural-language question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Metric name with underscores shown as spaces
    pub metric: String,
    /// Model actually used, upper-cased
    pub model: String,
    pub days_ahead: u32,
    pub prediction: f64,
    pub current_value: f64,
    pub change: f64,
    pub percentage_change: f64,
    pub change_label: Direction,
    pub forecast_data: Vec<TrajectoryPoint>,
}

impl ForecastReport {
    pub fn from_outcome(outcome: &ForecastOutcome) -> Self {
        let comparison = Comparison::between(outcome.current_value, outcome.prediction);
        Self {
            metric: outcome.metric.replace('_', " "),
            model: outcome.used_model.as_str().to_uppercase(),
            days_ahead: outcome.horizon_days,
            prediction: round_to(outcome.prediction, 2),
            current_value: round_to(outcome.current_value, 2),
            change: round_to(comparison.change, 2),
            percentage_change: round_to(comparison.percentage_change, 1),
            change_label: comparison.direction,
            forecast_data: outcome.trajectory.clone(),
        }
    }
}

/// Multi-model forecast over a daily path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredForecast {
    pub metric: String,
    pub forecast_days: u32,
    pub current_value: f64,
    /// Latest sustainability score as a percentage
    pub sustainability_score: f64,
    /// Daily path per model key; a substituted model is keyed `<requested>_fallback`
    pub predictions: BTreeMap<String, Vec<DatedPrediction>>,
    /// Last prediction of each path
    pub latest_predictions: BTreeMap<String, f64>,
}

/// Colored band of the score gauge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeStep {
    pub range: [u32; 2],
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeData {
    pub value: f64,
    pub axis_range: [u32; 2],
    pub steps: Vec<GaugeStep>,
}

/// Current sustainability score with its gauge description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGauge {
    pub current_score: f64,
    pub score_percentage: f64,
    pub gauge_data: GaugeData,
}

impl ScoreGauge {
    /// `percentage` is the score already scaled to 0..=100
    pub fn new(percentage: f64) -> Self {
        Self {
            current_score: round_to(percentage, 2),
            score_percentage: round_to(percentage, 2),
            gauge_data: GaugeData {
                value: percentage,
                axis_range: [0, 100],
                steps: vec![
                    GaugeStep {
                        range: [0, 40],
                        color: "red",
                    },
                    GaugeStep {
                        range: [40, 70],
                        color: "orange",
                    },
                    GaugeStep {
                        range: [70, 100],
                        color: "lightgreen",
                    },
                ],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableMetrics {
    pub available_metrics: Vec<String>,
    pub total_metrics: usize,
}

impl AvailableMetrics {
    pub fn new(available_metrics: Vec<String>) -> Self {
        Self {
            total_metrics: available_metrics.len(),
            available_metrics,
        }
    }
}
