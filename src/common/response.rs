use crate::modules::thumbnails::model::JobError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Envelope every endpoint answers with: `status` is `success` or `error`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            status: "success",
            message: message.to_string(),
            data: Some(data),
        }
    }
}

pub struct ApiSuccess<T>(pub ApiResponse<T>, pub StatusCode);

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.1, Json(self.0)).into_response()
    }
}

pub struct ApiError(pub String, pub StatusCode);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            status: "error",
            message: self.0,
            data: None,
        };
        (self.1, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let status = match &err {
            JobError::NotFound(_) => StatusCode::NOT_FOUND,
            JobError::Invalid(_) => StatusCode::BAD_REQUEST,
            JobError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            JobError::InvalidTransition { .. } => StatusCode::CONFLICT,
        };
        ApiError(err.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::thumbnails::model::JobStatus;
    use uuid::Uuid;

    #[test]
    fn job_errors_map_to_status_codes() {
        let cases = [
            (JobError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (JobError::QueueClosed, StatusCode::SERVICE_UNAVAILABLE),
            (
                JobError::Invalid(validator::ValidationErrors::new()),
                StatusCode::BAD_REQUEST,
            ),
            (
                JobError::InvalidTransition {
                    from: JobStatus::Failed,
                    to: JobStatus::Running,
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).1, expected);
        }
    }
}
