//! Application state - the services and the adapters behind them.

use std::sync::Arc;

use vertigo_core::ports::{
    AccountRepository, JobQueue, NotificationDispatcher, PostRepository, Sanitizer, SessionStore,
};
use vertigo_core::{AccountService, CredentialService, JobRouter, PostService, SearchService};
use vertigo_infra::{
    Argon2PasswordService, HtmlSanitizer, InMemoryAccountRepository, InMemoryJobQueue,
    InMemoryPostRepository, InMemorySessionStore, LogDispatcher, SettingsStore,
};

#[cfg(feature = "postgres")]
use vertigo_infra::{PostgresAccountRepository, PostgresPostRepository, connect, ensure_schema};

#[cfg(feature = "redis")]
use vertigo_infra::RedisSessionStore;

#[cfg(feature = "mailgun")]
use vertigo_infra::{MailgunConfig, MailgunDispatcher};

use crate::config::{AppConfig, MailBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub accounts: Arc<AccountService>,
    pub posts: Arc<PostService>,
    pub search: Arc<SearchService>,
    pub jobs: Arc<dyn JobQueue>,
    router: Arc<JobRouter>,
}

type Repositories = (Arc<dyn AccountRepository>, Arc<dyn PostRepository>);

impl AppState {
    /// Build the services with the best adapters the configuration allows.
    ///
    /// Unreachable databases or Redis fall back to in-memory adapters.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let settings = Arc::new(SettingsStore::load_or_init(&config.settings_path).await?);

        let (account_repo, post_repo) = repositories(config).await;
        let sessions = session_store(config).await;
        let notifier = notifier(config, settings.clone()).await?;

        let jobs: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(config.jobs.clone()));
        let passwords = Arc::new(Argon2PasswordService::new(&config.argon2)?);
        let sanitizer: Arc<dyn Sanitizer> = Arc::new(HtmlSanitizer::new());

        let credentials =
            CredentialService::new(passwords, account_repo.clone(), jobs.clone(), notifier);
        let accounts = Arc::new(AccountService::new(
            account_repo.clone(),
            sessions,
            credentials,
        ));
        let posts = Arc::new(PostService::new(
            post_repo.clone(),
            accounts.clone(),
            sanitizer.clone(),
            jobs.clone(),
        ));
        let search = Arc::new(SearchService::new(posts.clone(), sanitizer));
        let router = Arc::new(JobRouter::new(account_repo, post_repo));

        tracing::info!("Application state initialized");

        Ok(Self {
            settings,
            accounts,
            posts,
            search,
            jobs,
            router,
        })
    }

    /// Start the job workers that run view counting and recovery expiry.
    pub async fn start_workers(&self) -> anyhow::Result<()> {
        self.jobs.start_worker(self.router.clone().into_handler()).await?;
        Ok(())
    }
}

fn in_memory_repositories() -> Repositories {
    (
        Arc::new(InMemoryAccountRepository::new()),
        Arc::new(InMemoryPostRepository::new()),
    )
}

#[cfg(feature = "postgres")]
async fn repositories(config: &AppConfig) -> Repositories {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Records are kept in memory only.");
        return in_memory_repositories();
    };

    let db = match connect(db_config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
            return in_memory_repositories();
        }
    };

    if let Err(e) = ensure_schema(&db).await {
        tracing::error!(error = %e, "Failed to prepare database schema. Using in-memory fallback.");
        return in_memory_repositories();
    }

    (
        Arc::new(PostgresAccountRepository::new(db.clone())),
        Arc::new(PostgresPostRepository::new(db)),
    )
}

#[cfg(not(feature = "postgres"))]
async fn repositories(config: &AppConfig) -> Repositories {
    if config.database.is_some() {
        tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
    }
    in_memory_repositories()
}

#[cfg(feature = "redis")]
async fn session_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    let Some(redis_config) = &config.redis else {
        tracing::info!("REDIS_URL not set. Sessions are kept in memory.");
        return Arc::new(InMemorySessionStore::new(config.sessions.clone()));
    };

    match RedisSessionStore::new(redis_config.clone(), config.sessions.clone()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis. Sessions are kept in memory.");
            Arc::new(InMemorySessionStore::new(config.sessions.clone()))
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn session_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    Arc::new(InMemorySessionStore::new(config.sessions.clone()))
}

async fn notifier(
    config: &AppConfig,
    settings: Arc<SettingsStore>,
) -> anyhow::Result<Arc<dyn NotificationDispatcher>> {
    match config.mail_backend {
        #[cfg(feature = "mailgun")]
        MailBackend::Mailgun => {
            if !settings.current().await.mailer.is_configured() {
                tracing::warn!(
                    "Mailgun credentials missing; recovery mail fails until they are set"
                );
            }
            Ok(Arc::new(MailgunDispatcher::new(
                MailgunConfig::from_env(),
                settings,
            )?))
        }
        #[cfg(not(feature = "mailgun"))]
        MailBackend::Mailgun => {
            tracing::warn!("Built without the mailgun feature. Recovery links are only logged.");
            Ok(log_dispatcher(&settings).await)
        }
        MailBackend::Log => Ok(log_dispatcher(&settings).await),
    }
}

async fn log_dispatcher(settings: &SettingsStore) -> Arc<dyn NotificationDispatcher> {
    let hostname = settings.current().await.hostname;
    if hostname.is_empty() {
        Arc::new(LogDispatcher::new("localhost"))
    } else {
        Arc::new(LogDispatcher::new(hostname))
    }
}
