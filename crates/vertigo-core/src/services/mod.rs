//! Application services - the operations the outside world calls into.

mod accounts;
mod credentials;
pub mod guard;
pub mod jobs;
mod posts;
mod search;
pub mod text;

pub use accounts::{AccountService, Registration, mask_email};
pub use credentials::{CredentialService, RECOVERY_TTL_MINUTES};
pub use jobs::{BackgroundJob, JobRouter};
pub use posts::PostService;
pub use search::{MATCH_THRESHOLD, SearchService};
