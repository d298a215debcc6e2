//! Background worker that drains the enrichment queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use remind_core::{defaults, Error, Result};
use remind_engine::{EnrichmentPipeline, EnrichmentReport};

use crate::queue::{EnrichmentJob, JobReceiver};

/// Configuration for the enrichment worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether to process jobs at all.
    pub enabled: bool,
    /// Per-job wall-clock ceiling in seconds.
    pub job_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_timeout_secs: defaults::ENRICH_JOB_TIMEOUT_SECS,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ENRICH_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `ENRICH_JOB_TIMEOUT_SECS` | `60` | Per-job timeout |
    pub fn from_env() -> Self {
        let enabled = std::env::var("ENRICH_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let job_timeout_secs = std::env::var("ENRICH_JOB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::ENRICH_JOB_TIMEOUT_SECS)
            .max(1);

        Self {
            enabled,
            job_timeout_secs,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_job_timeout(mut self, secs: u64) -> Self {
        self.job_timeout_secs = secs;
        self
    }
}

/// Event emitted by the enrichment worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was picked up.
    JobStarted { reminder_id: Uuid },
    /// A job finished; the report says what each stage produced.
    JobCompleted {
        reminder_id: Uuid,
        report: EnrichmentReport,
    },
    /// A job failed or timed out.
    JobFailed { reminder_id: Uuid, error: String },
    /// Worker started draining the queue.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("failed to send shutdown signal".into()))
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that runs the enrichment pipeline over queued jobs, one at a
/// time in submission order.
pub struct EnrichmentWorker {
    pipeline: Arc<EnrichmentPipeline>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl EnrichmentWorker {
    pub fn new(pipeline: Arc<EnrichmentPipeline>, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            pipeline,
            config,
            event_tx,
        }
    }

    /// Start draining `jobs` and return a handle for control.
    pub fn start(self, jobs: JobReceiver) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(jobs, shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    async fn run(self, mut jobs: JobReceiver, mut shutdown_rx: mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!(subsystem = "jobs", "enrichment worker is disabled, not starting");
            return;
        }

        info!(
            subsystem = "jobs",
            job_timeout_secs = self.config.job_timeout_secs,
            "enrichment worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(subsystem = "jobs", "enrichment worker received shutdown signal");
                    break;
                }
                job = jobs.recv() => match job {
                    Some(job) => self.execute(job).await,
                    // Every queue handle dropped.
                    None => break,
                }
            }
        }

        info!(subsystem = "jobs", "enrichment worker stopped");
        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
    }

    async fn execute(&self, job: EnrichmentJob) {
        let reminder_id = job.reminder_id;
        let _ = self.event_tx.send(WorkerEvent::JobStarted { reminder_id });

        let timeout = Duration::from_secs(self.config.job_timeout_secs);
        let outcome =
            tokio::time::timeout(timeout, self.pipeline.enrich(reminder_id, &job.user)).await;

        match outcome {
            Ok(Ok((_, report))) => {
                info!(
                    subsystem = "jobs",
                    op = "enrich",
                    reminder_id = %reminder_id,
                    schedule = ?report.schedule,
                    line = ?report.line,
                    speech = ?report.speech,
                    "enrichment job completed"
                );
                let _ = self.event_tx.send(WorkerEvent::JobCompleted {
                    reminder_id,
                    report,
                });
            }
            Ok(Err(e)) => {
                warn!(
                    subsystem = "jobs",
                    op = "enrich",
                    reminder_id = %reminder_id,
                    error = %e,
                    "enrichment job failed"
                );
                let _ = self.event_tx.send(WorkerEvent::JobFailed {
                    reminder_id,
                    error: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    subsystem = "jobs",
                    op = "enrich",
                    reminder_id = %reminder_id,
                    timeout_secs = self.config.job_timeout_secs,
                    "enrichment job timed out"
                );
                let _ = self.event_tx.send(WorkerEvent::JobFailed {
                    reminder_id,
                    error: format!("timed out after {}s", self.config.job_timeout_secs),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EnrichmentQueue;
    use chrono::{Duration as ChronoDuration, Utc};
    use remind_core::{
        CreateReminderRequest, NotificationLineBackend, ReminderKind, ReminderRepository,
        ScheduleSuggestionBackend, ScheduleTime, ScheduleType, SpeechBackend, UserProfile,
    };
    use remind_db::InMemoryReminderRepository;
    use remind_engine::ScheduleResolver;
    use remind_inference::MockAssistantBackend;

    fn pipeline(
        repo: &InMemoryReminderRepository,
        mock: &MockAssistantBackend,
    ) -> Arc<EnrichmentPipeline> {
        let reminders: Arc<dyn ReminderRepository> = Arc::new(repo.clone());
        let resolver = ScheduleResolver::new(
            reminders.clone(),
            Some(Arc::new(mock.clone()) as Arc<dyn ScheduleSuggestionBackend>),
        );
        Arc::new(EnrichmentPipeline::new(
            reminders,
            resolver,
            Some(Arc::new(mock.clone()) as Arc<dyn NotificationLineBackend>),
            Some(Arc::new(mock.clone()) as Arc<dyn SpeechBackend>),
        ))
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            first_name: "Sam".to_string(),
            voice_id: None,
        }
    }

    async fn seed_task(repo: &InMemoryReminderRepository, owner: Uuid) -> Uuid {
        repo.insert(CreateReminderRequest {
            owner_id: owner,
            kind: ReminderKind::Task,
            title: "tea".to_string(),
            description: None,
            start_time: Some(Utc::now() + ChronoDuration::hours(2)),
            is_manual_schedule: true,
            schedule_type: ScheduleType::OneDay,
            schedule_days: vec![],
            schedule_time: ScheduleTime::default(),
            notification_minutes: None,
        })
        .await
        .unwrap()
    }

    async fn next_event(rx: &mut broadcast::Receiver<WorkerEvent>) -> WorkerEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for worker event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_worker_processes_submitted_job() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();
        let user = profile();
        let id = seed_task(&repo, user.id).await;

        let worker = EnrichmentWorker::new(pipeline(&repo, &mock), WorkerConfig::default());
        let (queue, rx) = EnrichmentQueue::bounded(4);
        let handle = worker.start(rx);
        let mut events = handle.events();

        assert!(matches!(next_event(&mut events).await, WorkerEvent::WorkerStarted));

        queue
            .submit(EnrichmentJob {
                reminder_id: id,
                user: user.clone(),
            })
            .unwrap();

        assert!(matches!(
            next_event(&mut events).await,
            WorkerEvent::JobStarted { reminder_id } if reminder_id == id
        ));
        match next_event(&mut events).await {
            WorkerEvent::JobCompleted { reminder_id, .. } => assert_eq!(reminder_id, id),
            other => panic!("expected completion, got {:?}", other),
        }

        let reminder = repo.fetch(id).await.unwrap();
        assert!(reminder.ai_notification_line.is_some());
        assert!(reminder.tts.is_some());
    }

    #[tokio::test]
    async fn test_worker_reports_missing_reminder_as_failure() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();

        let worker = EnrichmentWorker::new(pipeline(&repo, &mock), WorkerConfig::default());
        let (queue, rx) = EnrichmentQueue::bounded(4);
        let handle = worker.start(rx);
        let mut events = handle.events();
        assert!(matches!(next_event(&mut events).await, WorkerEvent::WorkerStarted));

        let missing = Uuid::new_v4();
        queue
            .submit(EnrichmentJob {
                reminder_id: missing,
                user: profile(),
            })
            .unwrap();

        assert!(matches!(next_event(&mut events).await, WorkerEvent::JobStarted { .. }));
        match next_event(&mut events).await {
            WorkerEvent::JobFailed { reminder_id, error } => {
                assert_eq!(reminder_id, missing);
                assert!(error.contains("not found"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_worker_processes_jobs_in_order() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();
        let user = profile();
        let first = seed_task(&repo, user.id).await;
        let second = seed_task(&repo, user.id).await;

        let worker = EnrichmentWorker::new(pipeline(&repo, &mock), WorkerConfig::default());
        let (queue, rx) = EnrichmentQueue::bounded(4);
        let handle = worker.start(rx);
        let mut events = handle.events();
        assert!(matches!(next_event(&mut events).await, WorkerEvent::WorkerStarted));

        for id in [first, second] {
            queue
                .submit(EnrichmentJob {
                    reminder_id: id,
                    user: user.clone(),
                })
                .unwrap();
        }

        let mut completed = Vec::new();
        while completed.len() < 2 {
            if let WorkerEvent::JobCompleted { reminder_id, .. } = next_event(&mut events).await {
                completed.push(reminder_id);
            }
        }
        assert_eq!(completed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_worker_shutdown_emits_stopped() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();

        let worker = EnrichmentWorker::new(pipeline(&repo, &mock), WorkerConfig::default());
        let (_queue, rx) = EnrichmentQueue::bounded(4);
        let handle = worker.start(rx);
        let mut events = handle.events();
        assert!(matches!(next_event(&mut events).await, WorkerEvent::WorkerStarted));

        handle.shutdown().await.unwrap();
        assert!(matches!(next_event(&mut events).await, WorkerEvent::WorkerStopped));
    }

    #[tokio::test]
    async fn test_disabled_worker_does_not_start() {
        let repo = InMemoryReminderRepository::new();
        let mock = MockAssistantBackend::new();

        let worker = EnrichmentWorker::new(
            pipeline(&repo, &mock),
            WorkerConfig::default().with_enabled(false),
        );
        let (_queue, rx) = EnrichmentQueue::bounded(4);
        let handle = worker.start(rx);
        let mut events = handle.events();

        // The worker task exits immediately, closing the event channel
        // without ever emitting WorkerStarted.
        let waited = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
        assert!(
            !matches!(waited, Ok(Ok(_))),
            "disabled worker must not emit events"
        );
    }

    #[test]
    fn test_config_from_env_defaults() {
        // No env vars set in the test process for these keys.
        std::env::remove_var("ENRICH_WORKER_ENABLED");
        std::env::remove_var("ENRICH_JOB_TIMEOUT_SECS");
        let config = WorkerConfig::from_env();
        assert!(config.enabled);
        assert_eq!(config.job_timeout_secs, defaults::ENRICH_JOB_TIMEOUT_SECS);
    }
}
