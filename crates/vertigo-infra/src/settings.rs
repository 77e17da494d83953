//! Site settings persisted as a JSON file next to the server.
//!
//! The file is created on first load with a fresh cookie secret and
//! `firstrun: true`. The secret never changes afterwards: every save
//! writes back the stored value regardless of what the caller passed.

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Mailgun credentials used for recovery mail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailerSettings {
    #[serde(rename = "mgdomain", default)]
    pub domain: String,
    #[serde(rename = "mgprikey", default)]
    pub private_key: String,
    #[serde(rename = "mgpubkey", default)]
    pub public_key: String,
}

impl MailerSettings {
    pub fn is_configured(&self) -> bool {
        !self.domain.trim().is_empty() && !self.private_key.trim().is_empty()
    }
}

/// Site-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "firstrun", default)]
    pub first_run: bool,
    #[serde(rename = "cookiehash", default)]
    pub cookie_secret: String,
    #[serde(rename = "mailgun", default)]
    pub mailer: MailerSettings,
}

impl SiteSettings {
    fn fresh() -> Self {
        Self {
            first_run: true,
            cookie_secret: Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Installation has already been completed")]
    AlreadyInstalled,

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// File-backed settings, loaded once at startup and shared as `Arc<SettingsStore>`.
///
/// Reads are served from memory. Writes are serialized and hit the file
/// before the in-memory copy changes.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<SiteSettings>,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// `SETTINGS_PATH`, defaulting to `settings.json` in the working directory.
    pub fn path_from_env() -> PathBuf {
        std::env::var("SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("settings.json"))
    }

    /// Load the settings file, creating it when missing or empty.
    pub async fn load_or_init(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let settings = if data.iter().all(u8::is_ascii_whitespace) {
            let settings = SiteSettings::fresh();
            write_file(&path, &settings).await?;
            tracing::info!(path = %path.display(), "Created new settings file");
            settings
        } else {
            let mut settings: SiteSettings = serde_json::from_slice(&data)?;
            if settings.cookie_secret.is_empty() {
                settings.cookie_secret = Uuid::new_v4().to_string();
                write_file(&path, &settings).await?;
                tracing::warn!("Settings file had no cookie secret, generated one");
            }
            settings
        };

        Ok(Self {
            path,
            current: RwLock::new(settings),
            write_lock: Mutex::new(()),
        })
    }

    pub async fn current(&self) -> SiteSettings {
        self.current.read().await.clone()
    }

    pub async fn secret(&self) -> String {
        self.current.read().await.cookie_secret.clone()
    }

    pub async fn is_first_run(&self) -> bool {
        self.current.read().await.first_run
    }

    /// Replace the settings. The stored cookie secret is kept.
    pub async fn save(&self, settings: SiteSettings) -> Result<SiteSettings, SettingsError> {
        let _guard = self.write_lock.lock().await;
        self.persist(settings).await
    }

    /// Store the installation wizard's input and leave first-run mode.
    ///
    /// Rejected with [`SettingsError::AlreadyInstalled`] once completed.
    pub async fn complete_installation(
        &self,
        mut settings: SiteSettings,
    ) -> Result<SiteSettings, SettingsError> {
        let _guard = self.write_lock.lock().await;

        if !self.current.read().await.first_run {
            tracing::warn!("Rejected attempt to change settings after installation");
            return Err(SettingsError::AlreadyInstalled);
        }
        if settings.name.trim().is_empty() {
            return Err(SettingsError::Invalid("name is required".to_string()));
        }
        if settings.hostname.trim().is_empty() {
            return Err(SettingsError::Invalid("hostname is required".to_string()));
        }

        settings.first_run = false;
        let saved = self.persist(settings).await?;
        tracing::info!(site = %saved.name, "Installation completed");
        Ok(saved)
    }

    // Caller holds `write_lock`.
    async fn persist(&self, mut settings: SiteSettings) -> Result<SiteSettings, SettingsError> {
        settings.cookie_secret = self.current.read().await.cookie_secret.clone();

        write_file(&self.path, &settings).await?;
        *self.current.write().await = settings.clone();

        Ok(settings)
    }
}

/// Write the settings with owner-only permissions.
async fn write_file(path: &Path, settings: &SiteSettings) -> Result<(), SettingsError> {
    let json = serde_json::to_vec_pretty(settings)?;

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(OWNER_ONLY);

    let mut file = options.open(path).await?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(OWNER_ONLY)).await?;
    file.write_all(&json).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(unix)]
const OWNER_ONLY: u32 = 0o600;

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard_input() -> SiteSettings {
        SiteSettings {
            name: "Foo Blog".to_string(),
            hostname: "example.com".to_string(),
            description: "Foo's test blog".to_string(),
            first_run: true,
            cookie_secret: "attacker-chosen".to_string(),
            mailer: MailerSettings {
                domain: "foo".to_string(),
                private_key: "foo".to_string(),
                public_key: "foo".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_first_load_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::load_or_init(&path).await.unwrap();

        assert!(store.is_first_run().await);
        assert!(!store.secret().await.is_empty());
        let on_disk: SiteSettings =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.cookie_secret, store.secret().await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_settings_file_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("settings.json");
        let existing = dir.path().join("existing.json");
        std::fs::write(&existing, b"").unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o644)).unwrap();

        SettingsStore::load_or_init(&fresh).await.unwrap();
        SettingsStore::load_or_init(&existing).await.unwrap();

        for path in [&fresh, &existing] {
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", path.display());
        }
    }

    #[tokio::test]
    async fn test_empty_file_is_first_run() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let store = SettingsStore::load_or_init(file.path()).await.unwrap();

        assert!(store.is_first_run().await);
    }

    #[tokio::test]
    async fn test_secret_survives_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::load_or_init(&path).await.unwrap();
        let secret = store.secret().await;

        let saved = store.complete_installation(wizard_input()).await.unwrap();
        assert_eq!(saved.cookie_secret, secret);
        assert!(!saved.first_run);

        let mut edited = store.current().await;
        edited.cookie_secret = "changed".to_string();
        edited.description = "New description".to_string();
        store.save(edited).await.unwrap();

        let reloaded = SettingsStore::load_or_init(&path).await.unwrap();
        let current = reloaded.current().await;
        assert_eq!(current.cookie_secret, secret);
        assert_eq!(current.description, "New description");
        assert!(!current.first_run);
    }

    #[tokio::test]
    async fn test_installation_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load_or_init(dir.path().join("settings.json"))
            .await
            .unwrap();

        store.complete_installation(wizard_input()).await.unwrap();
        let second = store.complete_installation(wizard_input()).await;

        assert!(matches!(second, Err(SettingsError::AlreadyInstalled)));
    }

    #[tokio::test]
    async fn test_installation_requires_name_and_hostname() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load_or_init(dir.path().join("settings.json"))
            .await
            .unwrap();

        let mut input = wizard_input();
        input.hostname = "  ".to_string();

        let result = store.complete_installation(input).await;

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
        assert!(store.is_first_run().await);
    }

    #[tokio::test]
    async fn test_reads_existing_file_format() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            concat!(
                r#"{"name":"Juuso's Blog","hostname":"example.com","firstrun":false,"#,
                r#""cookiehash":"abc","description":"d","#,
                r#""mailgun":{"mgdomain":"foo","mgprikey":"key","mgpubkey":"pub"}}"#,
            ),
        )
        .unwrap();

        let store = SettingsStore::load_or_init(file.path()).await.unwrap();
        let current = store.current().await;

        assert_eq!(current.name, "Juuso's Blog");
        assert_eq!(current.cookie_secret, "abc");
        assert!(current.mailer.is_configured());
        assert!(!store.is_first_run().await);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();

        let result = SettingsStore::load_or_init(file.path()).await;

        assert!(matches!(result, Err(SettingsError::Format(_))));
    }
}
