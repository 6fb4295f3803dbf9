use async_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum QueueError {
    #[error("queue has been shut down")]
    Closed,
}

/// FIFO of job ids shared by every worker. Each id is received by exactly
/// one worker.
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<Uuid>,
    rx: Receiver<Uuid>,
    shutdown: CancellationToken,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self {
            tx,
            rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn push(&self, job_id: Uuid) -> Result<(), QueueError> {
        if self.shutdown.is_cancelled() {
            return Err(QueueError::Closed);
        }
        self.tx.try_send(job_id).map_err(|e| match e {
            TrySendError::Closed(_) | TrySendError::Full(_) => QueueError::Closed,
        })?;
        debug!(%job_id, depth = self.tx.len(), "Job enqueued");
        Ok(())
    }

    /// Waits for the next job id. Returns `None` once shutdown has begun,
    /// including when an id arrives concurrently with the shutdown signal.
    pub async fn pop(&self) -> Option<Uuid> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            received = self.rx.recv() => match received {
                Ok(job_id) if !self.shutdown.is_cancelled() => Some(job_id),
                _ => None,
            },
        }
    }

    /// Stops all further dequeues and throws away whatever is still waiting.
    /// Returns the number of discarded ids.
    pub fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        self.tx.close();

        let mut discarded = 0;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        info!(discarded, "🛑 Job queue shut down");
        discarded
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
