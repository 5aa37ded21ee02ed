//! Pushover receiver — delivers alerts through the Pushover message API.

use super::{NotifyError, Receiver};
use crate::config::PushoverConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Pushover message endpoint.
const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sends alerts to a single Pushover recipient.
pub struct PushoverReceiver {
    name: String,
    user_key: String,
    token: String,
    priority: i8,
    http: reqwest::Client,
}

impl PushoverReceiver {
    pub fn new(cfg: &PushoverConfig, http: reqwest::Client) -> Self {
        Self {
            name: cfg.name.clone(),
            user_key: cfg.user_key.clone(),
            token: cfg.token.clone(),
            priority: cfg.priority,
            http,
        }
    }

    async fn send_message(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        let priority = self.priority.to_string();
        let params = [
            ("token", self.token.as_str()),
            ("user", self.user_key.as_str()),
            ("message", message),
            ("title", title),
            ("priority", priority.as_str()),
        ];

        let resp = self
            .http
            .post(PUSHOVER_API_URL)
            .form(&params)
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => Ok(()),
            status => Err(NotifyError::ServerError(status)),
        }
    }
}

#[async_trait]
impl Receiver for PushoverReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify_app_down(&self, app_name: &str, downtime: Duration) -> Result<(), NotifyError> {
        // Truncate to whole seconds so the message reads cleanly.
        let downtime = humantime::format_duration(Duration::from_secs(downtime.as_secs()));
        self.send_message(
            &format!("App \"{app_name}\" has not sent a live sign since {downtime}. It's probably dead."),
            &format!("{app_name} has died."),
        )
        .await
    }

    async fn notify_app_back(&self, app_name: &str) -> Result<(), NotifyError> {
        self.send_message(
            &format!("App \"{app_name}\" has reappeared after being dead."),
            &format!("{app_name} is back!"),
        )
        .await
    }
}
