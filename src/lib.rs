pub mod analyze;
pub mod config;
pub mod health;
pub mod media_ingestion;
pub mod model;
pub mod page;
pub mod processing;
pub mod request_counter;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::model::{ChatBackend, OpenAiCompatBackend, VisionClient};
use crate::request_counter::RequestCounter;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub vision: VisionClient,
    pub request_counter: RequestCounter,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let backend = Arc::new(OpenAiCompatBackend::new(http_client, &config));
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: Config, backend: Arc<dyn ChatBackend>) -> Self {
        let request_counter = RequestCounter::new();
        let vision = VisionClient::new(backend, &config, request_counter.clone());
        Self {
            config: Arc::new(config),
            vision,
            request_counter,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(analyze::index))
        .route("/analyze", post(analyze::analyze_page))
        .route("/api/analyze", post(analyze::analyze_json))
        .route("/health", get(health::health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
