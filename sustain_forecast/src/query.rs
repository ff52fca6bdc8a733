//! Natural-language question parsing
//!
//! Questions such as "What will CO2 emissions be in 45 days using lightgbm?"
//! are reduced to a [`ParsedQuestion`]: the target metric, the horizon in
//! days and the requested model family. Matching is case-insensitive and
//! purely lexical.

use crate::config::defaults;
use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use crate::schema;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Metric keywords, checked in order; the first one found wins.
pub const METRIC_ALIASES: [(&str, &str); 7] = [
    ("co2", schema::CO2),
    ("waste", schema::WASTE),
    ("score", schema::SCORE),
    ("sustainability", schema::SCORE),
    ("heat", schema::HEAT),
    ("electricity", schema::ELECTRICITY),
    ("power", schema::ELECTRICITY),
];

static HORIZON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(day|days|din)").expect("valid horizon pattern"));

/// Structured form of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuestion {
    /// Dataset column to forecast
    pub metric: String,
    pub horizon_days: u32,
    pub model: ModelKind,
}

/// Extracts metric, horizon and model from free text
#[derive(Debug, Clone)]
pub struct QuestionParser {
    default_horizon_days: u32,
}

impl Default for QuestionParser {
    fn default() -> Self {
        Self::new(defaults::HORIZON_DAYS)
    }
}

impl QuestionParser {
    pub fn new(default_horizon_days: u32) -> Self {
        Self {
            default_horizon_days,
        }
    }

    pub fn parse(&self, question: &str) -> Result<ParsedQuestion> {
        let text = question.to_lowercase();

        let horizon_days = match HORIZON_RE.captures(&text) {
            Some(caps) => {
                let digits = &caps[1];
                let days: u32 = digits.parse().map_err(|_| {
                    ForecastError::InvalidHorizon(format!("{} days is out of range", digits))
                })?;
                if days == 0 {
                    return Err(ForecastError::InvalidHorizon(
                        "horizon must be at least 1 day".to_string(),
                    ));
                }
                days
            }
            None => self.default_horizon_days,
        };

        let model = ModelKind::ALL
            .into_iter()
            .filter(|kind| *kind != defaults::FALLBACK_MODEL)
            .find(|kind| text.contains(kind.as_str()))
            .unwrap_or(defaults::FALLBACK_MODEL);

        let metric = METRIC_ALIASES
            .iter()
            .find(|(alias, _)| text.contains(alias))
            .map(|(_, column)| column.to_string())
            .ok_or_else(|| ForecastError::UnresolvedMetric {
                supported: supported_aliases(),
            })?;

        Ok(ParsedQuestion {
            metric,
            horizon_days,
            model,
        })
    }
}

/// Comma-separated alias list shown when no metric is recognized
pub fn supported_aliases() -> String {
    METRIC_ALIASES
        .iter()
        .map(|(alias, _)| if *alias == "co2" { "CO2" } else { *alias })
        .collect::<Vec<_>>()
        .join(", ")
}
