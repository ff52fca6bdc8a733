use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use sustain_forecast::response::AvailableMetrics;
use sustain_forecast::{ScoreGauge, StructuredForecast, StructuredRequest};

use crate::error::AppError;
use crate::handlers::AppState;

pub async fn forecast(
    State(state): State<AppState>,
    payload: Result<Json<StructuredRequest>, JsonRejection>,
) -> Result<Json<StructuredForecast>, AppError> {
    let Json(request) = payload?;
    let forecast = state.run(move |pipeline| pipeline.forecast(&request)).await?;
    Ok(Json(forecast))
}

pub async fn sustainability_score(State(state): State<AppState>) -> Result<Json<ScoreGauge>, AppError> {
    let gauge = state.run(|pipeline| pipeline.sustainability_score()).await?;
    Ok(Json(gauge))
}

pub async fn available_metrics(
    State(state): State<AppState>,
) -> Result<Json<AvailableMetrics>, AppError> {
    let metrics = state.run(|pipeline| pipeline.available_metrics()).await?;
    Ok(Json(metrics))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "ml-predictions"}))
}
