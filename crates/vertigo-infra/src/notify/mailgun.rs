//! Recovery mail through the Mailgun HTTP API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use vertigo_core::ports::{DispatchError, NotificationDispatcher, RecoveryNotice};

use crate::settings::{SettingsStore, SiteSettings};

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// API root, without the domain segment.
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for MailgunConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mailgun.net/v3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl MailgunConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("MAILGUN_API_BASE").unwrap_or(defaults.api_base),
            timeout: defaults.timeout,
        }
    }
}

/// Sends recovery mail with the credentials stored in the site settings.
///
/// Credentials are read on every send, so a completed installation takes
/// effect without a restart.
pub struct MailgunDispatcher {
    client: reqwest::Client,
    config: MailgunConfig,
    settings: Arc<SettingsStore>,
}

struct OutgoingMail {
    url: String,
    api_key: String,
    form: Vec<(&'static str, String)>,
}

impl MailgunDispatcher {
    pub fn new(config: MailgunConfig, settings: Arc<SettingsStore>) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DispatchError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            config,
            settings,
        })
    }

    fn compose(
        &self,
        site: &SiteSettings,
        notice: &RecoveryNotice,
    ) -> Result<OutgoingMail, DispatchError> {
        if !site.mailer.is_configured() {
            return Err(DispatchError::NotConfigured(
                "Mailgun domain or private key missing".to_string(),
            ));
        }

        let link = super::recovery_link(&site.hostname, notice.account_id, &notice.token);
        let sender = format!("{} <no-reply@{}>", site.name, site.mailer.domain);
        let text = format!(
            "Hello {},\n\nSomebody requested a password reset for your account on {}.\n\
             Follow the link below within 3 hours to choose a new password:\n\n{}\n\n\
             If you did not ask for this, you can ignore this message.\n",
            notice.name, site.name, link
        );

        Ok(OutgoingMail {
            url: format!(
                "{}/{}/messages",
                self.config.api_base.trim_end_matches('/'),
                site.mailer.domain
            ),
            api_key: site.mailer.private_key.clone(),
            form: vec![
                ("from", sender),
                ("to", notice.email.clone()),
                ("subject", format!("Password reset for {}", site.name)),
                ("text", text),
            ],
        })
    }
}

#[async_trait]
impl NotificationDispatcher for MailgunDispatcher {
    async fn send_recovery(&self, notice: RecoveryNotice) -> Result<(), DispatchError> {
        let site = self.settings.current().await;
        let mail = self.compose(&site, &notice)?;

        let response = self
            .client
            .post(&mail.url)
            .basic_auth("api", Some(&mail.api_key))
            .form(&mail.form)
            .send()
            .await
            .map_err(|e| DispatchError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Mailgun rejected recovery mail");
            return Err(DispatchError::Delivery(format!("Mailgun returned {status}")));
        }

        tracing::info!(account_id = %notice.account_id, "Recovery mail sent");
        Ok(())
    }
}
