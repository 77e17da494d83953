//! In-process fakes for the ports, used by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, AccountChanges, Post, PostChanges, PostFilter, SortOrder};
use crate::error::RepoError;
use crate::ports::{
    AccountRepository, AuthError, BaseRepository, DispatchError, Job, JobHandler, JobQueue,
    JobQueueError, NotificationDispatcher, PasswordService, PostRepository, QueueStats,
    RecoveryNotice, Sanitizer, SessionError, SessionStore,
};
use crate::services::{AccountService, CredentialService, PostService, Registration};

pub fn sample_account() -> Account {
    Account::new(
        "Juuso".to_string(),
        "juuso@example.com".to_string(),
        "plain$secret".to_string(),
        "Europe/Helsinki".to_string(),
    )
}

#[derive(Default)]
pub struct MemoryAccounts(Mutex<Vec<Account>>);

#[async_trait]
impl BaseRepository<Account, Uuid> for MemoryAccounts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        Ok(self.0.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, entity: Account) -> Result<Account, RepoError> {
        let mut rows = self.0.lock().unwrap();
        if rows.iter().any(|a| a.email == entity.email) {
            return Err(RepoError::Constraint("email".into()));
        }
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.0.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| a.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        Ok(self.0.lock().unwrap().iter().find(|a| a.email == email).cloned())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, RepoError> {
        let mut rows = self.0.lock().unwrap();
        let account = rows.iter_mut().find(|a| a.id == id).ok_or(RepoError::NotFound)?;
        changes.apply_to(account);
        Ok(account.clone())
    }

    async fn list(&self, order: SortOrder) -> Result<Vec<Account>, RepoError> {
        let mut accounts = self.0.lock().unwrap().clone();
        accounts.sort_by_key(|a| a.created_at);
        if order == SortOrder::CreatedDesc {
            accounts.reverse();
        }
        Ok(accounts)
    }
}

#[derive(Default)]
pub struct MemoryPosts(Mutex<Vec<Post>>);

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.0.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut rows = self.0.lock().unwrap();
        if rows.iter().any(|p| p.slug == entity.slug) {
            return Err(RepoError::Constraint("slug".into()));
        }
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.0.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self.0.lock().unwrap().iter().find(|p| p.slug == slug).cloned())
    }

    async fn update_fields(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        let mut rows = self.0.lock().unwrap();
        let post = rows.iter_mut().find(|p| p.id == id).ok_or(RepoError::NotFound)?;
        changes.apply_to(post);
        Ok(post.clone())
    }

    async fn list(&self, filter: PostFilter, order: SortOrder) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.created_at);
        if order == SortOrder::CreatedDesc {
            posts.reverse();
        }
        Ok(posts)
    }
}

/// Stores passwords as `plain$<password>`.
pub struct FakePasswords;

impl PasswordService for FakePasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        digest
            .strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or_else(|| AuthError::HashingError("unknown digest format".into()))
    }
}

#[derive(Default)]
pub struct MemorySessions(Mutex<Vec<(String, Uuid)>>);

#[async_trait]
impl SessionStore for MemorySessions {
    async fn get(&self, token: &str) -> Option<Uuid> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, id)| *id)
    }

    async fn set(&self, token: &str, account_id: Uuid) -> Result<(), SessionError> {
        self.0.lock().unwrap().push((token.to_string(), account_id));
        Ok(())
    }

    async fn clear(&self, token: &str) -> Result<(), SessionError> {
        self.0.lock().unwrap().retain(|(t, _)| t != token);
        Ok(())
    }
}

/// Records jobs instead of running them.
#[derive(Default)]
pub struct RecordingQueue(Mutex<Vec<Job>>);

impl RecordingQueue {
    pub fn enqueued(&self) -> Vec<Job> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        self.0.lock().unwrap().push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.0.lock().unwrap().len(),
            ..QueueStats::default()
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<RecoveryNotice>>,
    fail_next: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<RecoveryNotice> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn send_recovery(&self, notice: RecoveryNotice) -> Result<(), DispatchError> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(DispatchError::Delivery("mailbox unavailable".into()));
        }
        self.sent.lock().unwrap().push(notice);
        Ok(())
    }
}

/// Minimal tag remover, good enough for well-formed test markup.
pub struct TagStripper;

impl Sanitizer for TagStripper {
    fn strip_tags(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    fn normalize_line_breaks(&self, html: &str) -> String {
        ["</p>", "<br>", "</br>", "<br/>"]
            .iter()
            .fold(html.replace('\n', " "), |s, tag| s.replace(tag, "\n"))
    }
}

/// Shared fakes plus constructors for the services under test.
pub struct Harness {
    pub accounts: Arc<MemoryAccounts>,
    pub posts: Arc<MemoryPosts>,
    pub sessions: Arc<MemorySessions>,
    pub jobs: Arc<RecordingQueue>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(MemoryAccounts::default()),
            posts: Arc::new(MemoryPosts::default()),
            sessions: Arc::new(MemorySessions::default()),
            jobs: Arc::new(RecordingQueue::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn credentials(&self) -> CredentialService {
        CredentialService::new(
            Arc::new(FakePasswords),
            self.accounts.clone(),
            self.jobs.clone(),
            self.notifier.clone(),
        )
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(self.accounts.clone(), self.sessions.clone(), self.credentials())
    }

    /// Register `email` and return a live session token for it.
    pub async fn session_for(&self, email: &str) -> String {
        let accounts = self.account_service();
        let profile = accounts
            .register(Registration {
                name: email.to_string(),
                email: email.to_string(),
                password: "password".to_string(),
                location: "UTC".to_string(),
            })
            .await
            .unwrap();
        accounts.open_session(profile.id).await.unwrap()
    }

    pub async fn post_service_with_author(&self, email: &str) -> (PostService, String) {
        let session = self.session_for(email).await;
        let service = PostService::new(
            self.posts.clone(),
            Arc::new(self.account_service()),
            Arc::new(TagStripper),
            self.jobs.clone(),
        );
        (service, session)
    }

    /// Let detached tasks spawned by the services run.
    pub async fn settle(&self) {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }
}
