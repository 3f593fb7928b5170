use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthCheckResponse {
    status: String,
    model: String,
    translation_language: Option<String>,
    started_at: DateTime<Utc>,
    diagnosis_requests: u64,
    translation_requests: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let response = HealthCheckResponse {
        status: "ok".to_string(),
        model: state.vision.model().to_string(),
        translation_language: state.config.translation_language.clone(),
        started_at: state.request_counter.started_at(),
        diagnosis_requests: state.request_counter.diagnosis_count(),
        translation_requests: state.request_counter.translation_count(),
    };
    Json(response)
}
