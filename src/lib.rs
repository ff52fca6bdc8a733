//! # GreenView
//!
//! Workspace root for the GreenView sustainability forecasting service.
//!
//! - [`sustain_forecast`]: dataset loading, feature derivation, question
//!   parsing, regressors and the forecasting pipeline
//! - [`greenview_api`]: HTTP routes and the `greenview` command-line client
//!
//! ```no_run
//! use greenview_workspace::sustain_forecast::{Pipeline, Settings};
//!
//! let pipeline = Pipeline::new(&Settings::default());
//! let metrics = pipeline.available_metrics()?;
//! println!("{:?}", metrics.available_metrics);
//! # Ok::<(), greenview_workspace::sustain_forecast::ForecastError>(())
//! ```

pub use greenview_api;
pub use sustain_forecast;
