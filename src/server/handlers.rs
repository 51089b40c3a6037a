use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{FailureKind, PipelineError, Stage};
use crate::server::AppState;

/// Name of the multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub retryable: bool,
}

impl ErrorResponse {
    /// Problem with the upload itself, before the pipeline ran
    fn upload(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stage: None,
            kind: None,
            retryable: false,
        }
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            error: err.to_string(),
            stage: Some(err.stage),
            kind: Some(err.kind),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub transcription: &'static str,
    pub analysis: &'static str,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        transcription: state.pipeline.transcriber_name(),
        analysis: state.pipeline.engine_name(),
    })
}

/// HTTP status for a pipeline failure
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err.kind {
        FailureKind::ToolUnavailable | FailureKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
        FailureKind::ConversionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::Unreachable | FailureKind::Unauthorized | FailureKind::InvalidResponse => {
            StatusCode::BAD_GATEWAY
        }
        FailureKind::RateLimited | FailureKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[tracing::instrument(skip(state, multipart))]
pub async fn analyze_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return (
                    e.status(),
                    Json(ErrorResponse::upload(format!("Failed to read multipart: {}", e))),
                )
                    .into_response();
            }
        };

        let is_audio = field.name() == Some(AUDIO_FIELD) || field.file_name().is_some();
        if !is_audio {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        match field.bytes().await {
            Ok(data) => {
                upload = Some((data, file_name));
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read file bytes");
                return (
                    e.status(),
                    Json(ErrorResponse::upload(format!("Failed to read file: {}", e))),
                )
                    .into_response();
            }
        }
    }

    let Some((data, file_name)) = upload else {
        tracing::warn!("Analyze request with no file");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::upload("No audio file uploaded")),
        )
            .into_response();
    };

    if data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::upload("Uploaded audio file is empty")),
        )
            .into_response();
    }

    tracing::debug!(bytes = data.len(), file_name = ?file_name, "Audio upload received");

    match state.pipeline.run(&data, file_name.as_deref()).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::error!(stage = %e.stage, kind = ?e.kind, error = %e.message, "Analysis request failed");
            (status_for(&e), Json(ErrorResponse::from(&e))).into_response()
        }
    }
}
