//! Outbound run notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ncv_types::{NcvResult, ReportError, ENV_PUSHBULLET_TOKEN};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PUSHBULLET_PUSHES_URL: &str = "https://api.pushbullet.com/v2/pushes";

/// A titled message about a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Delivery channel for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> NcvResult<()>;

    fn name(&self) -> &str;
}

// ---- Pushbullet ----

#[derive(Debug, Serialize)]
struct PushNote<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    body: &'a str,
}

/// Sends a Pushbullet "note" push.
#[derive(Debug, Clone)]
pub struct PushbulletNotifier {
    token: String,
    endpoint: String,
    client: reqwest::Client,
}

impl PushbulletNotifier {
    pub fn new(token: impl Into<String>) -> NcvResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ReportError::MissingCredential {
                variable: ENV_PUSHBULLET_TOKEN.to_string(),
            }
            .into());
        }
        Ok(Self {
            token,
            endpoint: PUSHBULLET_PUSHES_URL.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Point at a different pushes endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    async fn notify(&self, notification: &Notification) -> NcvResult<()> {
        let note = PushNote {
            kind: "note",
            title: &notification.title,
            body: &notification.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Access-Token", &self.token)
            .json(&note)
            .send()
            .await
            .map_err(|e| ReportError::Notification {
                message: format!("Pushbullet request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Notification {
                message: format!("Pushbullet returned {}: {}", status, body),
            }
            .into());
        }

        tracing::info!("Sent Pushbullet note '{}'", notification.title);
        Ok(())
    }

    fn name(&self) -> &str {
        "pushbullet"
    }
}

// ---- Log ----

/// Writes the notification to the log instead of sending it anywhere.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> NcvResult<()> {
        tracing::info!("{}: {}", notification.title, notification.body);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

// ---- Memory ----

/// Keeps every notification it receives.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: &Notification) -> NcvResult<()> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
