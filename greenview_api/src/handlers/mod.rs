pub mod copilot;
pub mod forecasts;

use crate::error::AppError;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use sustain_forecast::Pipeline;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Run a pipeline call on the blocking pool; loading and training are CPU and I/O bound.
    pub async fn run<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: FnOnce(&Pipeline) -> sustain_forecast::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || call(&pipeline)).await?;
        Ok(result?)
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "GreenView Sustainability Intelligence API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
        "endpoints": {
            "ai_copilot": "/api/v1/ai-copilot/",
            "ml_predictions": "/api/v1/ml-predictions/",
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "greenview"}))
}
