use super::model::{Job, JobError, JobState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory job registry. Records are replaced whole under the write lock,
/// so readers never observe a half-applied update.
#[derive(Clone, Default)]
pub struct JobRepository {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Applies a forward state change and returns the updated record.
    pub async fn transition(&self, id: Uuid, next: JobState) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().await;
        let current = jobs.get(&id).ok_or(JobError::NotFound(id))?;

        let mut updated = current.clone();
        updated.transition(next)?;
        jobs.insert(id, updated.clone());
        Ok(updated)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}
