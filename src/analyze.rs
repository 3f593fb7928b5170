use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::AppState;
use crate::media_ingestion::{EncodeFormat, UploadedFile, read_upload, upload::UploadError};
use crate::model::ModelError;
use crate::page::{self, PageContent};
use crate::processing::{
    BoundingBox, BoxExtraction, IngestError, UploadedImage, draw_bounding_box, image::encode_rgb,
    image::data_url,
};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("Error occurred during analysis: {0}")]
    Model(#[from] ModelError),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::Upload(UploadError::Multipart(e)) => e.status(),
            AnalyzeError::Upload(UploadError::MissingFile) => StatusCode::BAD_REQUEST,
            AnalyzeError::Model(ModelError::Encoding(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalyzeError::Ingest(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::Model(_) => StatusCode::BAD_GATEWAY,
            AnalyzeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}

/// Everything one upload produced, with images inlined as data URLs.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub file_name: String,
    pub format: EncodeFormat,
    pub width: u32,
    pub height: u32,
    pub diagnosis: String,
    pub translation_language: Option<String>,
    pub translation: Option<String>,
    pub box_status: &'static str,
    pub bounding_box: Option<BoundingBox>,
    /// Why a box-like fragment in the reply could not be used.
    pub box_note: Option<String>,
    pub within_bounds: Option<bool>,
    pub original_image: String,
    pub annotated_image: Option<String>,
}

pub fn ingest(upload: &UploadedFile) -> Result<UploadedImage, AnalyzeError> {
    let image = UploadedImage::decode(&upload.file_name, &upload.data).map_err(|e| {
        tracing::warn!("Rejected upload {}: {}", upload.file_name, e);
        e
    })?;
    Ok(image)
}

/// Diagnosis, then translation when enabled, then box extraction and overlay.
///
/// A diagnosis failure returns before any of the later steps run.
pub async fn analyze_image(
    state: &AppState,
    image: UploadedImage,
    original_image: String,
) -> Result<AnalysisReport, AnalyzeError> {
    let analysis_id = Uuid::new_v4();
    tracing::info!("Analysis {} started for {}", analysis_id, image.file_name);

    let diagnosis = state
        .vision
        .diagnose_data_url(&image, original_image.clone())
        .await
        .map_err(|e| {
            tracing::error!("Analysis {} failed: {}", analysis_id, e);
            e
        })?;

    let translation_language = state.config.translation_language.clone();
    let translation = match &translation_language {
        Some(language) => Some(state.vision.translate(&diagnosis.text, language).await),
        None => None,
    };

    let extraction = diagnosis.extraction();
    let (bounding_box, box_note, within_bounds, annotated_image) = match &extraction {
        BoxExtraction::Found(bbox) => {
            let overlay = draw_bounding_box(&image.pixels, bbox);
            let annotated = data_url(image.format, &encode_rgb(&overlay.image, image.format)?);
            (Some(*bbox), None, Some(overlay.within_bounds), Some(annotated))
        }
        BoxExtraction::NotFound => (None, None, None, None),
        BoxExtraction::Malformed(reason) => {
            tracing::warn!("Analysis {}: unusable bounding box, {}", analysis_id, reason);
            (None, Some(reason.clone()), None, None)
        }
    };

    tracing::info!(
        "Analysis {} finished | box: {} | translated: {}",
        analysis_id,
        extraction.status(),
        translation.is_some()
    );

    Ok(AnalysisReport {
        analysis_id,
        file_name: image.file_name.clone(),
        format: image.format,
        width: image.width(),
        height: image.height(),
        diagnosis: diagnosis.text,
        translation_language,
        translation,
        box_status: extraction.status(),
        bounding_box,
        box_note,
        within_bounds,
        original_image,
        annotated_image,
    })
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state.config.title, PageContent::Upload))
}

pub async fn analyze_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let title = state.config.title.clone();
    let failed = |err: AnalyzeError, original: Option<&str>| {
        let message = err.to_string();
        (
            err.status_code(),
            Html(page::render(
                &title,
                PageContent::Failed {
                    original_image: original,
                    message: &message,
                },
            )),
        )
    };

    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return failed(e.into(), None),
    };
    let image = match ingest(&upload) {
        Ok(image) => image,
        Err(e) => return failed(e, None),
    };
    let original = match image.data_url() {
        Ok(url) => url,
        Err(e) => return failed(e.into(), None),
    };

    match analyze_image(&state, image, original.clone()).await {
        Ok(report) => (
            StatusCode::OK,
            Html(page::render(&title, PageContent::Report(&report))),
        ),
        Err(e) => failed(e, Some(&original)),
    }
}

pub async fn analyze_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AnalyzeError> {
    let upload = read_upload(multipart).await?;
    let image = ingest(&upload)?;
    let original = image.data_url()?;
    let report = analyze_image(&state, image, original).await?;
    Ok(Json(report))
}
