use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationErrors;

pub const JOB_KIND: &str = "thumbnails";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Where the video comes from. Exactly one of the two, by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    Path(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParams {
    pub video_id: String,
    pub out_base_path: PathBuf,
    pub source: VideoSource,
    pub interval_sec: Option<f64>,
    pub tile_w: Option<u32>,
    pub tile_h: Option<u32>,
    pub cols: Option<u32>,
    pub rows: Option<u32>,
    pub callback_url: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpriteInfo {
    pub path: String,
    pub index: u32,
}

/// Effective values a run actually used, after defaults and the frame budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CueMeta {
    pub tile_w: u32,
    pub tile_h: u32,
    pub cols: u32,
    pub rows: u32,
    pub interval: f64,
    pub frames: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CueFileInfo {
    pub path: String,
    pub meta: CueMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThumbnailsResult {
    pub sprites: Vec<SpriteInfo>,
    pub vtt: CueFileInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded(ThumbnailsResult),
    Failed(String),
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued => JobStatus::Queued,
            JobState::Running => JobStatus::Running,
            JobState::Succeeded(_) => JobStatus::Succeeded,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded(_) | JobState::Failed(_))
    }

    fn rank(&self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::Running => 1,
            JobState::Succeeded(_) | JobState::Failed(_) => 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),
    #[error("job cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("job queue is shutting down")]
    QueueClosed,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub params: JobParams,
    pub state: JobState,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Job {
    pub fn new(params: JobParams) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            params,
            state: JobState::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Moves the job strictly forward. A terminal job never changes again.
    pub fn transition(&mut self, next: JobState) -> Result<(), JobError> {
        if next.rank() <= self.state.rank() {
            return Err(JobError::InvalidTransition {
                from: self.state.status(),
                to: next.status(),
            });
        }
        self.state = next;
        self.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ThumbnailsResult> {
        match &self.state {
            JobState::Succeeded(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_params(out_base: impl Into<PathBuf>) -> JobParams {
    JobParams {
        video_id: "vid-1".to_string(),
        out_base_path: out_base.into(),
        source: VideoSource::Path(PathBuf::from("/videos/in.mp4")),
        interval_sec: None,
        tile_w: None,
        tile_h: None,
        cols: None,
        rows: None,
        callback_url: None,
        auth_token: None,
    }
}
