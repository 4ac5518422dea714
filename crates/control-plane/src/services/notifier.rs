// Side-effect collaborators backed by storage and a mail transport
// Decision: Audit logs and in-app notifications are plain rows in the same store
// Decision: Email delivery is a JSON webhook; without one, emails are logged

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventdesk_core::{AdminEmail, AuditEntry, NewNotification, Notifier, StatusEmail};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageBackend;

/// A rendered email ready for delivery
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Email transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Delivers mail by POSTing it as JSON to a webhook
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
}

impl HttpMailer {
    pub fn new(url: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let response = self.client.post(&self.url).json(mail).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(recipients = mail.to.len(), subject = %mail.subject, "Email delivered");
        Ok(())
    }
}

/// Logs mail instead of sending it (dev mode)
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = ?mail.to, subject = %mail.subject, "Email (not sent, no mail webhook configured)");
        Ok(())
    }
}

/// Production notifier: audit and notification rows in storage, email via `Mailer`
pub struct StorageNotifier {
    storage: Arc<StorageBackend>,
    mailer: Arc<dyn Mailer>,
}

impl StorageNotifier {
    pub fn new(storage: Arc<StorageBackend>, mailer: Arc<dyn Mailer>) -> Self {
        Self { storage, mailer }
    }
}

#[async_trait]
impl Notifier for StorageNotifier {
    async fn send_status_email(&self, email: &StatusEmail) -> anyhow::Result<()> {
        self.mailer
            .send(&OutgoingMail {
                to: vec![email.to_email.clone()],
                subject: email.subject.clone(),
                body: email.body.clone(),
            })
            .await?;
        Ok(())
    }

    async fn send_admin_email(&self, email: &AdminEmail) -> anyhow::Result<()> {
        let to: Vec<String> = self
            .storage
            .list_admins()
            .await?
            .into_iter()
            .map(|admin| admin.email)
            .collect();
        if to.is_empty() {
            tracing::debug!(registration_id = %email.registration_id, "No admins to email");
            return Ok(());
        }
        self.mailer
            .send(&OutgoingMail {
                to,
                subject: email.subject.clone(),
                body: email.body.clone(),
            })
            .await?;
        Ok(())
    }

    async fn create_notification(&self, notification: &NewNotification) -> anyhow::Result<()> {
        let user_id = notification
            .user_id
            .ok_or_else(|| anyhow::anyhow!("notification has no recipient"))?;
        self.storage.insert_notification(user_id, notification).await?;
        Ok(())
    }

    async fn create_admin_notification(
        &self,
        notification: &NewNotification,
    ) -> anyhow::Result<()> {
        let written = self.storage.insert_admin_notifications(notification).await?;
        tracing::debug!(admins = written, "Admin notifications created");
        Ok(())
    }

    async fn log_action(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        self.storage.insert_audit_log(entry).await?;
        Ok(())
    }
}
