//! # GreenView API
//!
//! HTTP surface of the sustainability forecasting pipeline:
//!
//! - `POST /api/v1/ml-predictions/forecast`: multi-model daily forecast
//! - `GET  /api/v1/ml-predictions/sustainability-score`: score gauge
//! - `GET  /api/v1/ml-predictions/available-metrics`: forecastable metrics
//! - `POST /api/v1/ai-copilot/chat`: natural-language forecast question
//!
//! Errors are returned as `{"detail": "..."}` with status 400 for request or
//! dataset problems and 500 otherwise.

pub mod config;
pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub use crate::config::ServerConfig;
pub use crate::error::AppError;
pub use crate::handlers::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ml_predictions = Router::new()
        .route("/forecast", post(handlers::forecasts::forecast))
        .route("/sustainability-score", get(handlers::forecasts::sustainability_score))
        .route("/available-metrics", get(handlers::forecasts::available_metrics))
        .route("/health", get(handlers::forecasts::health));

    let ai_copilot = Router::new()
        .route("/chat", post(handlers::copilot::chat))
        .route("/health", get(handlers::copilot::health));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1/ml-predictions", ml_predictions)
        .nest("/api/v1/ai-copilot", ai_copilot)
        .layer(cors)
        .with_state(state)
}
