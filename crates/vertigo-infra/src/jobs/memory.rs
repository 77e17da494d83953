//! In-memory job queue.
//!
//! Jobs live in an mpsc channel and are processed by local workers.
//! Delayed jobs wait on a timer task before entering the channel.
//! Jobs are lost on process restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use vertigo_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of pending jobs (0 = unlimited).
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 4,
        }
    }
}

impl InMemoryJobQueueConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.workers),
        }
    }
}

#[derive(Default)]
struct JobStats {
    scheduled: AtomicUsize,
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// In-memory job queue with delayed scheduling and bounded retries.
pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    started: AtomicBool,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(100));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            started: AtomicBool::new(false),
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(InMemoryJobQueueConfig::from_env())
    }

    fn schedule(&self, job: Job, delay: Duration) {
        let sender = self.job_sender.clone();
        let stats = self.stats.clone();
        stats.scheduled.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            delay_secs = delay.as_secs(),
            "Job scheduled"
        );

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            stats.scheduled.fetch_sub(1, Ordering::Relaxed);
            stats.pending.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = sender.send(job).await {
                stats.pending.fetch_sub(1, Ordering::Relaxed);
                tracing::error!(error = %e, "Failed to release scheduled job");
            }
        });
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new(InMemoryJobQueueConfig::default())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if let Some(delay) = job.remaining_delay() {
            self.schedule(job, delay);
            return Ok(());
        }

        if self.config.max_size > 0 {
            let current_size = self.stats.pending.load(Ordering::Relaxed);
            if current_size >= self.config.max_size {
                return Err(JobQueueError::QueueFull);
            }
        }

        self.stats.pending.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.job_sender.send(job).await {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(JobQueueError::EnqueueError(e.to_string()));
        }

        tracing::debug!(
            pending = self.stats.pending.load(Ordering::Relaxed),
            "Job enqueued"
        );

        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(JobQueueError::AlreadyStarted);
        }

        let handler = Arc::new(handler);

        for worker_id in 0..self.config.workers.max(1) {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let stats = self.stats.clone();
            let sender = self.job_sender.clone();

            tokio::spawn(async move {
                tracing::info!(worker = worker_id, "Job worker started");

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!(worker = worker_id, "Job worker shutting down");
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Processing job"
                    );

                    job.attempts += 1;
                    let result = handler(job.clone()).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed");
                        }
                        JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                max_attempts = job.max_attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            stats.pending.fetch_add(1, Ordering::Relaxed);
                            let sender = sender.clone();
                            let stats = stats.clone();
                            let backoff = Duration::from_millis(100 * u64::from(job.attempts));
                            tokio::spawn(async move {
                                tokio::time::sleep(backoff).await;
                                if let Err(e) = sender.send(job).await {
                                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                                    tracing::error!(
                                        error = %e,
                                        "Failed to re-enqueue job for retry"
                                    );
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed permanently"
                            );
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            scheduled: self.stats.scheduled.load(Ordering::Relaxed),
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}
