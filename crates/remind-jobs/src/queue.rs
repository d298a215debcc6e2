//! In-process enrichment job queue.
//!
//! Creating a reminder must stay fast, so enrichment runs off the
//! request path: the caller submits a job and returns immediately,
//! while the worker drains the queue. The queue is a bounded channel;
//! submission never blocks and reports a full or stopped queue as an
//! error instead.

use tokio::sync::mpsc;
use uuid::Uuid;

use remind_core::{defaults, Error, Result, UserProfile};

/// A unit of enrichment work.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub reminder_id: Uuid,
    /// Profile snapshot taken at submission time; the worker does not
    /// re-read user data.
    pub user: UserProfile,
}

/// Receiving half of the queue, consumed by the worker.
pub type JobReceiver = mpsc::Receiver<EnrichmentJob>;

/// Submission half of the queue. Cheap to clone; every API handler
/// holds one.
#[derive(Clone)]
pub struct EnrichmentQueue {
    tx: mpsc::Sender<EnrichmentJob>,
}

impl EnrichmentQueue {
    /// Create a queue with the given capacity.
    pub fn bounded(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Create a queue with the default capacity.
    pub fn with_default_capacity() -> (Self, JobReceiver) {
        Self::bounded(defaults::ENRICH_QUEUE_CAPACITY)
    }

    /// Enqueue a job without waiting. Fails when the queue is full or
    /// the worker has stopped.
    pub fn submit(&self, job: EnrichmentJob) -> Result<()> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => Error::Job(format!(
                "enrichment queue full, dropping job for reminder {}",
                job.reminder_id
            )),
            mpsc::error::TrySendError::Closed(job) => Error::Job(format!(
                "enrichment worker stopped, dropping job for reminder {}",
                job.reminder_id
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> EnrichmentJob {
        EnrichmentJob {
            reminder_id: Uuid::new_v4(),
            user: UserProfile {
                id: Uuid::new_v4(),
                first_name: "Sam".to_string(),
                voice_id: None,
            },
        }
    }

    #[tokio::test]
    async fn test_submit_and_receive() {
        let (queue, mut rx) = EnrichmentQueue::bounded(4);
        let submitted = job();
        queue.submit(submitted.clone()).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.reminder_id, submitted.reminder_id);
    }

    #[tokio::test]
    async fn test_submit_fails_when_full() {
        let (queue, _rx) = EnrichmentQueue::bounded(1);
        queue.submit(job()).unwrap();

        let err = queue.submit(job()).unwrap_err();
        assert!(matches!(err, Error::Job(_)));
        assert!(err.to_string().contains("full"));
    }

    #[tokio::test]
    async fn test_submit_fails_when_worker_stopped() {
        let (queue, rx) = EnrichmentQueue::bounded(4);
        drop(rx);

        let err = queue.submit(job()).unwrap_err();
        assert!(matches!(err, Error::Job(_)));
        assert!(err.to_string().contains("stopped"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        // A zero-capacity channel would panic in tokio.
        let (queue, _rx) = EnrichmentQueue::bounded(0);
        assert!(queue.submit(job()).is_ok());
    }
}
