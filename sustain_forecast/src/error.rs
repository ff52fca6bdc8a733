//! Error types for the sustain_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the sustain_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Every configured data source failed or returned an empty table
    #[error("No data available: {0}")]
    DataUnavailable(String),

    /// The loaded table has no timestamp column
    #[error("Missing '{0}' column in dataset")]
    MissingTimestampColumn(String),

    /// A timestamp value could not be read as a calendar date
    #[error("Invalid timestamp at row {row}: '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    /// The question did not mention any supported metric
    #[error("Couldn't detect the metric you're asking about. Supported metrics: {supported}")]
    UnresolvedMetric { supported: String },

    /// The requested metric is not a column of the loaded dataset
    #[error("Column '{0}' not found in dataset")]
    MetricNotInDataset(String),

    /// Horizon outside of 1..=max
    #[error("Invalid horizon: {0}")]
    InvalidHorizon(String),

    /// No rows left once incomplete rows are dropped
    #[error("No valid data for training '{0}'")]
    InsufficientTrainingData(String),

    /// A regressor could not be fitted
    #[error("Model fit failed for {model}: {reason}")]
    ModelFit { model: String, reason: String },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error while reading configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the primary database source
    #[error("Database error: {0}")]
    Database(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from data processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Anything unanticipated
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// Whether the error is caused by the request or the dataset shape
    /// rather than by the service itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ForecastError::MissingTimestampColumn(_)
                | ForecastError::InvalidTimestamp { .. }
                | ForecastError::UnresolvedMetric { .. }
                | ForecastError::MetricNotInDataset(_)
                | ForecastError::InvalidHorizon(_)
                | ForecastError::InsufficientTrainingData(_)
                | ForecastError::InvalidParameter(_)
        )
    }
}

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<postgres::Error> for ForecastError {
    fn from(err: postgres::Error) -> Self {
        ForecastError::Database(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_facing() {
        assert!(ForecastError::MissingTimestampColumn("Timestamp".into()).is_validation());
        assert!(ForecastError::MetricNotInDataset("Water_L".into()).is_validation());
        assert!(ForecastError::InsufficientTrainingData("CO2_Emissions_kg".into()).is_validation());
        assert!(!ForecastError::Internal("boom".into()).is_validation());
        assert!(!ForecastError::DataUnavailable("all sources failed".into()).is_validation());
    }
}
