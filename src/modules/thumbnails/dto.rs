use super::model::{
    JOB_KIND, Job, JobParams, JobStatus, ThumbnailsResult, VideoSource,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_source_choice"))]
pub struct CreateThumbnailsJobRequest {
    #[validate(length(min = 1, message = "video_id required"))]
    pub video_id: String,
    #[validate(length(min = 1, message = "out_base_path required"))]
    pub out_base_path: String,
    pub src_path: Option<String>,
    #[validate(url)]
    pub src_url: Option<String>,

    #[validate(range(min = 0.2, max = 120.0))]
    pub interval_sec: Option<f64>,
    #[validate(range(min = 16, max = 2048))]
    pub tile_w: Option<u32>,
    #[validate(range(min = 16, max = 2048))]
    pub tile_h: Option<u32>,
    #[validate(range(min = 1, max = 500))]
    pub cols: Option<u32>,
    #[validate(range(min = 1, max = 500))]
    pub rows: Option<u32>,

    #[validate(url)]
    pub callback_url: Option<String>,
    pub auth_token: Option<String>,
}

fn is_given(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn validate_source_choice(req: &CreateThumbnailsJobRequest) -> Result<(), ValidationError> {
    match (is_given(&req.src_path), is_given(&req.src_url)) {
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(ValidationError::new("source")
            .with_message("src_path or src_url required".into())),
        (true, true) => Err(ValidationError::new("source")
            .with_message("give either src_path or src_url, not both".into())),
    }
}

impl CreateThumbnailsJobRequest {
    /// Call after `validate()`; the source choice is assumed to be sound.
    pub fn into_params(self) -> JobParams {
        let source = match self.src_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => VideoSource::Path(PathBuf::from(path)),
            None => VideoSource::Url(self.src_url.unwrap_or_default()),
        };
        JobParams {
            video_id: self.video_id,
            out_base_path: PathBuf::from(self.out_base_path.trim_end_matches('/')),
            source,
            interval_sec: self.interval_sec,
            tile_w: self.tile_w,
            tile_h: self.tile_h,
            cols: self.cols,
            rows: self.rows,
            callback_url: self.callback_url.filter(|u| !u.trim().is_empty()),
            auth_token: self.auth_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobInfoResponse {
    pub job_id: Uuid,
    pub kind: String,
    pub status: JobStatus,
    pub error: Option<String>,
    pub result: Option<ThumbnailsResult>,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

impl From<Job> for JobInfoResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            kind: JOB_KIND.to_string(),
            status: job.status(),
            error: job.error().map(str::to_string),
            result: job.result().cloned(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> CreateThumbnailsJobRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn minimal_local_request_is_valid() {
        let req = request(json!({
            "video_id": "v1",
            "out_base_path": "/storage/v1/",
            "src_path": "/videos/v1.mp4"
        }));
        assert!(req.validate().is_ok());

        let params = req.into_params();
        assert_eq!(params.out_base_path, PathBuf::from("/storage/v1"));
        assert_eq!(params.source, VideoSource::Path("/videos/v1.mp4".into()));
        assert_eq!(params.interval_sec, None);
    }

    #[test]
    fn url_source_is_accepted() {
        let req = request(json!({
            "video_id": "v1",
            "out_base_path": "/storage/v1",
            "src_url": "https://cdn.example.com/v1.mp4",
            "callback_url": "https://app.example.com/hooks/thumbs",
            "auth_token": "t0k"
        }));
        assert!(req.validate().is_ok());
        let params = req.into_params();
        assert_eq!(params.source, VideoSource::Url("https://cdn.example.com/v1.mp4".into()));
        assert_eq!(params.auth_token.as_deref(), Some("t0k"));
    }

    #[test]
    fn missing_or_double_source_is_rejected() {
        let neither = request(json!({"video_id": "v1", "out_base_path": "/o"}));
        let err = neither.validate().unwrap_err();
        assert!(err.to_string().contains("src_path or src_url required"));

        let both = request(json!({
            "video_id": "v1",
            "out_base_path": "/o",
            "src_path": "/a.mp4",
            "src_url": "https://x/a.mp4"
        }));
        assert!(both.validate().is_err());
    }

    #[test]
    fn empty_output_path_is_rejected() {
        let req = request(json!({"video_id": "v1", "out_base_path": "", "src_path": "/a.mp4"}));
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("out_base_path"));
    }

    #[test]
    fn out_of_range_tuning_is_rejected() {
        for (field, value) in [
            ("interval_sec", json!(0.1)),
            ("interval_sec", json!(121.0)),
            ("tile_w", json!(8)),
            ("tile_h", json!(4096)),
            ("cols", json!(0)),
            ("rows", json!(501)),
        ] {
            let mut body = json!({"video_id": "v1", "out_base_path": "/o", "src_path": "/a.mp4"});
            body[field] = value;
            let err = request(body).validate().unwrap_err();
            assert!(err.field_errors().contains_key(field), "{field} should be rejected");
        }
    }

    #[test]
    fn response_reflects_job_state() {
        let job = Job::new(super::super::model::sample_params("/o"));
        let id = job.id;
        let value = serde_json::to_value(JobInfoResponse::from(job)).unwrap();
        assert_eq!(value["job_id"], id.to_string());
        assert_eq!(value["kind"], "thumbnails");
        assert_eq!(value["status"], "queued");
        assert!(value["error"].is_null());
        assert!(value["result"].is_null());
    }
}
