use crate::config::settings::AppConfig;
use crate::infrastructure::queue::JobQueue;
use crate::modules::thumbnails::callback::CallbackNotifier;
use crate::modules::thumbnails::repository::JobRepository;
use crate::pipeline::ThumbnailPipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jobs: JobRepository,
    pub queue: JobQueue,
    pub pipeline: ThumbnailPipeline,
    pub notifier: CallbackNotifier,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        pipeline: ThumbnailPipeline,
        notifier: CallbackNotifier,
    ) -> Self {
        Self {
            config: Arc::new(config),
            jobs: JobRepository::new(),
            queue: JobQueue::new(),
            pipeline,
            notifier,
        }
    }
}
