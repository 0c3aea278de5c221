use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::analyzer::{AnalysisRequest, SampleRepo, SAMPLE_ERRORS, SAMPLE_REPOS};
use crate::story::{generate_story, DEFAULT_MODEL_TYPE};

/// Routes under `/api`.
pub fn api_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/jira/generate-content", post(generate_content))
        .route("/tickets/generate-content", post(generate_content))
        .route("/error-analysis", post(error_analysis))
        .route("/error-analysis/samples", get(samples))
}

/// Error body shaped as `{"detail": "..."}`.
pub(super) struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

pub(super) async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "faultline API is running",
    }))
}

fn default_model_type() -> String {
    DEFAULT_MODEL_TYPE.to_string()
}

#[derive(Deserialize)]
struct ContentRequest {
    description: String,
    #[serde(default = "default_model_type")]
    model_type: String,
}

#[derive(Serialize)]
struct ContentResponse {
    content: String,
}

/// POST /api/jira/generate-content (also served as /api/tickets/generate-content)
///
/// Failures come back as the content text, the way the ticket form shows them.
async fn generate_content(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ContentRequest>,
) -> Json<ContentResponse> {
    let content = match generate_story(state.analyzer.llm(), &request.description, &request.model_type).await {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(error = %err, "ticket content generation failed");
            err.to_string()
        }
    };
    Json(ContentResponse { content })
}

#[derive(Deserialize)]
struct ErrorAnalysisRequest {
    error_message: String,
    repo_url: String,
}

#[derive(Serialize)]
struct ErrorAnalysisResponse {
    analysis: String,
    raw_text: String,
}

/// POST /api/error-analysis
async fn error_analysis(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ErrorAnalysisRequest>,
) -> Result<Json<ErrorAnalysisResponse>, ApiError> {
    if request.error_message.trim().is_empty() || request.repo_url.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Both error message and repository URL are required",
        ));
    }

    let analysis_request = AnalysisRequest::new(request.error_message, request.repo_url)
        .with_days(state.lookback_days)
        .with_max_files(state.max_files);

    let text = state
        .analyzer
        .transcript(&analysis_request, |line| tracing::info!("{}", line))
        .await;

    Ok(Json(ErrorAnalysisResponse {
        analysis: text.clone(),
        raw_text: text,
    }))
}

#[derive(Serialize)]
struct SamplesResponse {
    errors: &'static [&'static str],
    repos: &'static [SampleRepo],
}

/// GET /api/error-analysis/samples
async fn samples() -> Json<SamplesResponse> {
    Json(SamplesResponse {
        errors: SAMPLE_ERRORS,
        repos: SAMPLE_REPOS,
    })
}
