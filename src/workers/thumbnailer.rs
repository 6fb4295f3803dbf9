use crate::modules::thumbnails::model::JobState;
use crate::state::AppState;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Handle on the running workers. Dropping it aborts them; `join` waits for
/// them to leave their loops after the queue has been shut down.
pub struct WorkerPool {
    tasks: JoinSet<()>,
}

impl WorkerPool {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub async fn join(mut self) {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res {
                error!("Thumbnail worker ended abnormally: {}", e);
            }
        }
        info!("🛑 All thumbnail workers stopped");
    }
}

pub fn start_worker_pool(state: AppState, count: usize) -> WorkerPool {
    let count = count.max(1);
    info!("🎞️ Starting {} thumbnail worker(s)...", count);

    let mut tasks = JoinSet::new();
    for worker_id in 0..count {
        tasks.spawn(run_worker(state.clone(), worker_id));
    }
    WorkerPool { tasks }
}

async fn run_worker(state: AppState, worker_id: usize) {
    info!(worker_id, "🎞️ Thumbnail worker listening");

    // Jobs are processed one at a time per worker; ffmpeg is the bottleneck.
    while let Some(job_id) = state.queue.pop().await {
        process_job(&state, job_id, worker_id).await;
    }

    info!(worker_id, "Thumbnail worker leaving");
}

async fn process_job(state: &AppState, job_id: Uuid, worker_id: usize) {
    let job = match state.jobs.transition(job_id, JobState::Running).await {
        Ok(job) => job,
        Err(e) => {
            warn!(%job_id, worker_id, "Skipping job: {}", e);
            return;
        }
    };
    let video_id = job.params.video_id.as_str();
    info!(%job_id, %video_id, worker_id, "📦 Processing thumbnail job");

    let next = match state
        .pipeline
        .run(job_id, &job.params, &state.config.pipeline)
        .await
    {
        Ok(result) => {
            info!(
                %job_id,
                %video_id,
                sprites = result.sprites.len(),
                frames = result.vtt.meta.frames,
                "✅ Thumbnail job succeeded"
            );
            JobState::Succeeded(result)
        }
        Err(e) => {
            error!(%job_id, %video_id, "❌ Thumbnail job failed: {}", e);
            JobState::Failed(e.to_string())
        }
    };

    match state.jobs.transition(job_id, next).await {
        Ok(job) => state.notifier.notify(&job, &state.config.callback).await,
        Err(e) => error!(%job_id, "Could not record job outcome: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::thumbnails::model::{Job, JobStatus};
    use crate::modules::thumbnails::service::ThumbnailsService;
    use crate::test_support::{FakeProber, FakeSampler, SamplerBehavior, test_state};
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    async fn submit(state: &AppState, out_base: &Path, source: &Path) -> Uuid {
        let req = serde_json::from_value(json!({
            "video_id": "vid-1",
            "out_base_path": out_base.to_str().unwrap(),
            "src_path": source.to_str().unwrap(),
            "tile_w": 32,
            "tile_h": 18,
            "cols": 2,
            "rows": 2
        }))
        .unwrap();
        ThumbnailsService::submit(state, req).await.unwrap().job_id
    }

    async fn wait_for(state: &AppState, id: Uuid, done: impl Fn(&Job) -> bool) -> Job {
        timeout(Duration::from_secs(10), async {
            loop {
                if let Some(job) = state.jobs.find_by_id(id).await {
                    if done(&job) {
                        return job;
                    }
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("job did not reach the expected state in time")
    }

    fn source_file(dir: &Path) -> std::path::PathBuf {
        let source = dir.join("in.mp4");
        std::fs::write(&source, b"not really a video").unwrap();
        source
    }

    #[tokio::test]
    async fn pool_processes_every_job_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let state = test_state(
            FakeSampler::new(SamplerBehavior::Frames(5)),
            FakeProber::duration(10.0),
        );
        let pool = start_worker_pool(state.clone(), 2);
        assert_eq!(pool.len(), 2);

        let mut submitted = Vec::new();
        for i in 0..3 {
            let out = dir.path().join(format!("out-{i}"));
            submitted.push((submit(&state, &out, &source).await, out));
        }

        for (id, out) in &submitted {
            let job = wait_for(&state, *id, |j| j.state.is_terminal()).await;
            assert_eq!(job.status(), JobStatus::Succeeded, "{:?}", job.error());

            let result = job.result().unwrap();
            assert_eq!(result.sprites.len(), 2);
            assert_eq!(result.vtt.meta.frames, 5);
            assert!(out.join("sprites/sprite_0001.jpg").is_file());
            assert!(out.join("sprites/sprite_0002.jpg").is_file());
            assert!(out.join("sprites/thumbs.vtt").is_file());
        }

        state.queue.shutdown();
        pool.join().await;
    }

    #[tokio::test]
    async fn pipeline_failure_marks_job_failed() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let state = test_state(
            FakeSampler::new(SamplerBehavior::Fail("moov atom not found".into())),
            FakeProber::unknown(),
        );
        let pool = start_worker_pool(state.clone(), 1);

        let out = dir.path().join("out");
        let id = submit(&state, &out, &source).await;
        let job = wait_for(&state, id, |j| j.state.is_terminal()).await;

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().unwrap().contains("moov atom not found"));
        assert!(!out.join("sprites").exists());

        state.queue.shutdown();
        pool.join().await;
    }

    #[tokio::test]
    async fn job_not_in_queued_state_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let state = test_state(
            FakeSampler::new(SamplerBehavior::Frames(1)),
            FakeProber::duration(2.0),
        );
        let id = submit(&state, &dir.path().join("out"), &source).await;
        state
            .jobs
            .transition(id, JobState::Failed("cancelled".into()))
            .await
            .unwrap();

        let popped = state.queue.pop().await.unwrap();
        process_job(&state, popped, 0).await;

        let job = state.jobs.find_by_id(id).await.unwrap();
        assert_eq!(job.error(), Some("cancelled"));
    }

    #[tokio::test]
    async fn shutdown_leaves_waiting_jobs_queued() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let state = test_state(
            FakeSampler::new(SamplerBehavior::Frames(1)),
            FakeProber::duration(2.0),
        );
        let a = submit(&state, &dir.path().join("a"), &source).await;
        let b = submit(&state, &dir.path().join("b"), &source).await;

        assert_eq!(state.queue.shutdown(), 2);
        let pool = start_worker_pool(state.clone(), 2);
        pool.join().await;

        for id in [a, b] {
            let job = state.jobs.find_by_id(id).await.unwrap();
            assert_eq!(job.status(), JobStatus::Queued);
        }
    }

    #[tokio::test]
    async fn in_flight_job_finishes_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path());
        let state = test_state(
            FakeSampler::new(SamplerBehavior::Frames(2)).with_delay(Duration::from_millis(200)),
            FakeProber::duration(4.0),
        );
        let pool = start_worker_pool(state.clone(), 1);

        let id = submit(&state, &dir.path().join("out"), &source).await;
        wait_for(&state, id, |j| j.status() == JobStatus::Running).await;

        state.queue.shutdown();
        pool.join().await;

        let job = state.jobs.find_by_id(id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Succeeded);
    }
}
