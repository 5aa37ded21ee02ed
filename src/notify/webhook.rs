//! Webhook receiver — POSTs JSON notification events to a configured URL.
//!
//! Any 2xx response counts as delivered; everything else is a delivery
//! failure reported back to the dispatching watcher.

use super::{NotificationEvent, NotifyError, Receiver};
use crate::config::WebhookConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Sends notification events to an arbitrary HTTP endpoint.
pub struct WebhookReceiver {
    name: String,
    url: String,
    http: reqwest::Client,
}

impl WebhookReceiver {
    pub fn new(cfg: &WebhookConfig, http: reqwest::Client) -> Self {
        Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            http,
        }
    }

    async fn post_event(&self, event: &NotificationEvent<'_>) -> Result<(), NotifyError> {
        let resp = self.http.post(&self.url).json(event).send().await?;

        match resp.status() {
            status if status.is_success() => Ok(()),
            status => Err(NotifyError::ServerError(status)),
        }
    }
}

#[async_trait]
impl Receiver for WebhookReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify_app_down(&self, app_name: &str, downtime: Duration) -> Result<(), NotifyError> {
        self.post_event(&NotificationEvent::Down {
            app: app_name,
            downtime_secs: downtime.as_secs(),
        })
        .await
    }

    async fn notify_app_back(&self, app_name: &str) -> Result<(), NotifyError> {
        self.post_event(&NotificationEvent::Back { app: app_name })
            .await
    }
}
