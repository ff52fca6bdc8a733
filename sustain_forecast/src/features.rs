//! Time features and the sustainability score
//!
//! [`prepare`] turns a raw [`Dataset`] into a [`PreparedDataset`]: rows are
//! sorted by timestamp (stable, so equal timestamps keep their load order),
//! calendar features are derived from each timestamp, and the composite
//! sustainability score is computed and min-max normalized over the loaded
//! rows.

use crate::data::{DataOrigin, Dataset};
use crate::error::{ForecastError, Result};
use crate::schema;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a timestamp; values with a UTC offset are converted to UTC wall time
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .map(|date| date.and_time(NaiveTime::default()))
    })
}

/// Observations sorted by timestamp, with derived features and the score
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    timestamps: Vec<NaiveDateTime>,
    months: Vec<u32>,
    days_of_year: Vec<u32>,
    elapsed_days: Vec<i64>,
    /// Every numeric column, derived ones included
    columns: BTreeMap<String, Vec<Option<f64>>>,
    /// Raw columns that hold text
    text_columns: Vec<String>,
    origin: DataOrigin,
}

impl PreparedDataset {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn origin(&self) -> &DataOrigin {
        &self.origin
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn days_of_year(&self) -> &[u32] {
        &self.days_of_year
    }

    pub fn elapsed_days(&self) -> &[i64] {
        &self.elapsed_days
    }

    /// Numeric column by name
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Whether the column exists at all, numeric or not
    pub fn has_column(&self, name: &str) -> bool {
        name == schema::TIMESTAMP
            || self.columns.contains_key(name)
            || self.text_columns.iter().any(|c| c == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Latest non-missing value of a numeric column
    pub fn latest_value(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().rev().find_map(|v| *v)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }
}

/// Derive time features and the sustainability score
pub fn prepare(dataset: &Dataset) -> Result<PreparedDataset> {
    if !dataset.has_column(schema::TIMESTAMP) {
        return Err(ForecastError::MissingTimestampColumn(schema::TIMESTAMP.to_string()));
    }

    let raw_timestamps = dataset
        .column_as_strings(schema::TIMESTAMP)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let text = value.unwrap_or_default();
            parse_timestamp(&text).ok_or(ForecastError::InvalidTimestamp { row, value: text })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..raw_timestamps.len()).collect();
    order.sort_by_key(|&i| raw_timestamps[i]);
    let timestamps: Vec<NaiveDateTime> = order.iter().map(|&i| raw_timestamps[i]).collect();

    let mut columns = BTreeMap::new();
    let mut text_columns = Vec::new();
    for name in dataset.column_names() {
        if name == schema::TIMESTAMP || schema::DERIVED.contains(&name.as_str()) {
            continue;
        }
        match dataset.column_as_f64(&name) {
            Ok(values) => {
                let sorted: Vec<Option<f64>> = order.iter().map(|&i| values[i]).collect();
                columns.insert(name, sorted);
            }
            Err(ForecastError::DataError(reason)) => {
                tracing::debug!(column = %name, %reason, "Keeping non-numeric column out of the feature set");
                text_columns.push(name);
            }
            Err(err) => return Err(err),
        }
    }

    let first = timestamps.first().copied();
    let years: Vec<i32> = timestamps.iter().map(|ts| ts.year()).collect();
    let months: Vec<u32> = timestamps.iter().map(|ts| ts.month()).collect();
    let days_of_year: Vec<u32> = timestamps.iter().map(|ts| ts.ordinal()).collect();
    let elapsed_days: Vec<i64> = timestamps
        .iter()
        .map(|ts| first.map_or(0, |first| (*ts - first).num_days()))
        .collect();

    let score = sustainability_score(&columns, timestamps.len());
    columns.insert(schema::SCORE.to_string(), score);
    columns.insert(schema::YEAR.to_string(), as_column(&years));
    columns.insert(schema::MONTH.to_string(), as_column(&months));
    columns.insert(schema::DAY_OF_YEAR.to_string(), as_column(&days_of_year));
    columns.insert(schema::ELAPSED_DAYS.to_string(), elapsed_days.iter().map(|&d| Some(d as f64)).collect());

    tracing::debug!(
        rows = timestamps.len(),
        numeric_columns = columns.len(),
        "Prepared dataset"
    );

    Ok(PreparedDataset {
        timestamps,
        months,
        days_of_year,
        elapsed_days,
        columns,
        text_columns,
        origin: dataset.origin().clone(),
    })
}

fn as_column<T: Copy + Into<f64>>(values: &[T]) -> Vec<Option<f64>> {
    values.iter().map(|&v| Some(v.into())).collect()
}

/// Weighted raw score per row, normalized to [0, 1] over the rows that have one
fn sustainability_score(columns: &BTreeMap<String, Vec<Option<f64>>>, rows: usize) -> Vec<Option<f64>> {
    let weighted: Vec<(&Vec<Option<f64>>, f64)> = schema::SCORE_WEIGHTS
        .iter()
        .filter_map(|(name, weight)| columns.get(*name).map(|values| (values, *weight)))
        .collect();

    let raw: Vec<Option<f64>> = (0..rows)
        .map(|row| {
            weighted
                .iter()
                .try_fold(0.0, |acc, (values, weight)| values[row].map(|v| acc + weight * v))
        })
        .collect();

    let (min, max) = raw
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    raw.into_iter()
        .map(|value| {
            value.map(|v| {
                if range > 0.0 && range.is_finite() {
                    (v - min) / range
                } else {
                    0.0
                }
            })
        })
        .collect()
}
