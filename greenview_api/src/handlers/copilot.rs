use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sustain_forecast::ForecastReport;

use crate::error::AppError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Answer a free-text forecast question
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ForecastReport>, AppError> {
    let Json(request) = payload?;
    let report = state.run(move |pipeline| pipeline.ask(&request.question)).await?;
    Ok(Json(report))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "ai-copilot"}))
}
