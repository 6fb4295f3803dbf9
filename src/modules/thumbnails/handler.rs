use super::dto::{CreateThumbnailsJobRequest, JobInfoResponse};
use super::service::ThumbnailsService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Submit a thumbnail sprite job
#[utoipa::path(
    post,
    path = "/api/v1/jobs/thumbnails",
    request_body = CreateThumbnailsJobRequest,
    responses(
        (status = 202, description = "Job accepted", body = ApiResponse<JobInfoResponse>),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Service is shutting down")
    ),
    tag = "Jobs"
)]
pub async fn create_thumbnails_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateThumbnailsJobRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(e) => return ApiError(e.body_text(), StatusCode::BAD_REQUEST).into_response(),
    };

    match ThumbnailsService::submit(&state, payload).await {
        Ok(job) => ApiSuccess(
            ApiResponse::success(job, "Job accepted"),
            StatusCode::ACCEPTED,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get job status
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = ApiResponse<JobInfoResponse>),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse {
    match ThumbnailsService::get_job(&state, job_id).await {
        Ok(job) => ApiSuccess(
            ApiResponse::success(job, "Job retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
