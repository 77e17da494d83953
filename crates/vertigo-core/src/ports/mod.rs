//! Ports - trait definitions for external collaborators.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod notify;
mod repository;
mod sanitize;

pub use auth::{AuthError, PasswordService, SessionError, SessionStore};
pub use job_queue::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};
pub use notify::{DispatchError, NotificationDispatcher, RecoveryNotice};
pub use repository::{AccountRepository, BaseRepository, PostRepository};
pub use sanitize::Sanitizer;
