//! Background work: view counting and recovery-token expiry.
//!
//! Both run detached from the request that triggered them. Failures end up
//! in the log and nowhere else.

use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::{AccountChanges, PostChanges};
use crate::error::RepoError;
use crate::ports::{
    AccountRepository, BaseRepository, Job, JobHandler, JobQueue, JobResult, PostRepository,
};

pub const INCREMENT_VIEWS: &str = "post.increment_views";
pub const EXPIRE_RECOVERY: &str = "account.expire_recovery";

/// Typed view of the jobs this crate enqueues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundJob {
    IncrementViews { post_id: Uuid },
    ExpireRecovery { account_id: Uuid },
}

impl BackgroundJob {
    pub fn job_type(&self) -> &'static str {
        match self {
            Self::IncrementViews { .. } => INCREMENT_VIEWS,
            Self::ExpireRecovery { .. } => EXPIRE_RECOVERY,
        }
    }

    pub fn into_job(self) -> Job {
        let payload = match self {
            Self::IncrementViews { post_id } => json!({ "post_id": post_id }),
            Self::ExpireRecovery { account_id } => json!({ "account_id": account_id }),
        };
        Job::new(self.job_type(), payload)
    }

    pub fn from_job(job: &Job) -> Result<Self, String> {
        match job.job_type.as_str() {
            INCREMENT_VIEWS => Ok(Self::IncrementViews {
                post_id: uuid_field(&job.payload, "post_id")?,
            }),
            EXPIRE_RECOVERY => Ok(Self::ExpireRecovery {
                account_id: uuid_field(&job.payload, "account_id")?,
            }),
            other => Err(format!("unknown job type `{other}`")),
        }
    }
}

fn uuid_field(payload: &Value, name: &str) -> Result<Uuid, String> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| format!("missing or malformed `{name}`"))
}

/// Hand a job to the queue without waiting on it.
pub(crate) fn dispatch_detached(queue: Arc<dyn JobQueue>, job: Job) {
    tokio::spawn(async move {
        let job_type = job.job_type.clone();
        if let Err(e) = queue.enqueue(job).await {
            tracing::warn!(job_type = %job_type, error = %e, "Failed to enqueue background job");
        }
    });
}

/// Executes [`BackgroundJob`]s pulled off the queue.
pub struct JobRouter {
    accounts: Arc<dyn AccountRepository>,
    posts: Arc<dyn PostRepository>,
}

impl JobRouter {
    pub fn new(accounts: Arc<dyn AccountRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { accounts, posts }
    }

    /// Wrap the router as a queue handler.
    pub fn into_handler(self: Arc<Self>) -> JobHandler {
        Box::new(move |job| {
            let router = self.clone();
            Box::pin(async move { router.handle(job).await })
        })
    }

    pub async fn handle(&self, job: Job) -> JobResult {
        match BackgroundJob::from_job(&job) {
            Ok(BackgroundJob::IncrementViews { post_id }) => self.increment_views(post_id).await,
            Ok(BackgroundJob::ExpireRecovery { account_id }) => {
                self.expire_recovery(account_id).await
            }
            Err(reason) => {
                tracing::error!(job_id = %job.id, reason = %reason, "Unroutable job");
                JobResult::Failed(reason)
            }
        }
    }

    /// Read-modify-write; concurrent increments may lose updates.
    async fn increment_views(&self, post_id: Uuid) -> JobResult {
        let post = match self.posts.find_by_id(post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => return JobResult::Failed(format!("post {post_id} no longer exists")),
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "analytics: failed to load post");
                return JobResult::Retry(e.to_string());
            }
        };

        let changes = PostChanges {
            view_count: Some(post.view_count.saturating_add(1)),
            ..PostChanges::default()
        };

        match self.posts.update_fields(post_id, changes).await {
            Ok(updated) => {
                tracing::trace!(post_id = %post_id, views = updated.view_count, "View counted");
                JobResult::Success
            }
            Err(RepoError::NotFound) => {
                JobResult::Failed(format!("post {post_id} no longer exists"))
            }
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "analytics: failed to count view");
                JobResult::Retry(e.to_string())
            }
        }
    }

    /// Clears unconditionally. A token already consumed or replaced is cleared just the same.
    async fn expire_recovery(&self, account_id: Uuid) -> JobResult {
        match self
            .accounts
            .update_fields(account_id, AccountChanges::clear_recovery())
            .await
        {
            Ok(_) => {
                tracing::debug!(account_id = %account_id, "Recovery token expired");
                JobResult::Success
            }
            Err(RepoError::NotFound) => {
                JobResult::Failed(format!("account {account_id} no longer exists"))
            }
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "expire recovery failed");
                JobResult::Retry(e.to_string())
            }
        }
    }
}
