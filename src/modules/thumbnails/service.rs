use super::dto::{CreateThumbnailsJobRequest, JobInfoResponse};
use super::model::{Job, JobError, JobState};
use crate::pipeline::orchestrator::effective_layout;
use crate::pipeline::sprite::SheetSizeError;
use crate::state::AppState;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

fn oversized_sheet(err: SheetSizeError) -> JobError {
    let mut errors = ValidationErrors::new();
    errors.add(
        "__all__",
        ValidationError::new("sheet_size").with_message(err.to_string().into()),
    );
    JobError::Invalid(errors)
}

pub struct ThumbnailsService;

impl ThumbnailsService {
    /// Registers a queued job and hands its id to the worker pool.
    pub async fn submit(
        state: &AppState,
        req: CreateThumbnailsJobRequest,
    ) -> Result<JobInfoResponse, JobError> {
        req.validate()?;
        let params = req.into_params();
        effective_layout(&params, &state.config.pipeline)
            .checked_sheet_size()
            .map_err(oversized_sheet)?;
        if state.queue.is_shut_down() {
            return Err(JobError::QueueClosed);
        }

        let job = Job::new(params);
        let job_id = job.id;
        let video_id = job.params.video_id.clone();
        state.jobs.insert(job.clone()).await;

        if state.queue.push(job_id).is_err() {
            // shutdown raced the submission; never leave the record dangling
            warn!(%job_id, "Queue closed while submitting, failing job");
            let _ = state
                .jobs
                .transition(job_id, JobState::Failed(JobError::QueueClosed.to_string()))
                .await;
            return Err(JobError::QueueClosed);
        }

        info!(%job_id, %video_id, "📥 Thumbnail job queued");
        Ok(JobInfoResponse::from(job))
    }

    pub async fn get_job(state: &AppState, id: Uuid) -> Result<JobInfoResponse, JobError> {
        state
            .jobs
            .find_by_id(id)
            .await
            .map(JobInfoResponse::from)
            .ok_or(JobError::NotFound(id))
    }
}
