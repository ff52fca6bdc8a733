//! # Sustain Forecast
//!
//! A Rust library for forecasting sustainability metrics from time-stamped
//! operational data.
//!
//! ## Features
//!
//! - Dataset loading with fallbacks (PostgreSQL, CSV, synthetic data)
//! - Calendar features and a normalized composite sustainability score
//! - Natural-language question parsing
//! - Tree-ensemble regressors (two gradient boosting variants, random forest)
//! - Point forecasts, trajectories and daily paths with before/after comparison
//!
//! ## Quick Start
//!
//! ```no_run
//! use sustain_forecast::{Pipeline, Settings};
//!
//! let settings = Settings::load()?;
//! let pipeline = Pipeline::new(&settings);
//!
//! let report = pipeline.ask("What will CO2 emissions be in 45 days using lightgbm?")?;
//! println!("{} -> {} ({})", report.current_value, report.prediction, report.change_label);
//! # Ok::<(), sustain_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod response;
pub mod schema;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Settings;
pub use crate::data::{DataLoader, DataOrigin, Dataset};
pub use crate::engine::{ForecastEngine, ForecastOutcome, TrainedForecaster};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{prepare, PreparedDataset};
pub use crate::models::{ModelKind, Regressor};
pub use crate::pipeline::{Pipeline, StructuredRequest};
pub use crate::query::{ParsedQuestion, QuestionParser};
pub use crate::response::{ForecastReport, ScoreGauge, StructuredForecast};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
