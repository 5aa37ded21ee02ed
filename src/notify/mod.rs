//! Notification receivers
//!
//! A [`Receiver`] is an abstract notification sink: given an app name and
//! either a down event (with the downtime so far) or a back event, it
//! attempts delivery through some external channel and reports the result.
//!
//! The watcher core only depends on this trait. Adding a new receiver type
//! means implementing [`Receiver`] and wiring it up in [`from_config`] —
//! no watcher changes.
//!
//! Delivery is best-effort: failures are returned to the dispatching
//! watcher, which logs them per-receiver and moves on. Nothing here retries.

mod pushover;
mod webhook;

pub use pushover::PushoverReceiver;
pub use webhook::WebhookReceiver;

use crate::config::ReceiversConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Timeout for a single delivery attempt.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised by a delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    ServerError(reqwest::StatusCode),
}

/// A notification sink for app liveness events.
///
/// Receivers are shared read-only across all watchers that reference them
/// and must tolerate concurrent invocation.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Name the receiver was declared under in the configuration.
    fn name(&self) -> &str;

    /// Deliver a "this app has not checked in for `downtime`" alert.
    ///
    /// Called once when an app first goes dead, then once per repeat
    /// interval while it stays dead.
    async fn notify_app_down(&self, app_name: &str, downtime: Duration) -> Result<(), NotifyError>;

    /// Deliver a "this app has recovered" alert.
    ///
    /// Called at most once per down episode, on the transition back to alive.
    async fn notify_app_back(&self, app_name: &str) -> Result<(), NotifyError>;
}

/// Wire-level event shape delivered by the webhook receiver.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent<'a> {
    /// The app has not checked in within its timeout
    Down {
        app: &'a str,
        downtime_secs: u64,
    },
    /// The app has started checking in again
    Back { app: &'a str },
}

/// Construct every receiver declared in the configuration.
///
/// All receivers share one HTTP client with a delivery timeout.
pub fn from_config(cfg: &ReceiversConfig) -> Result<Vec<Arc<dyn Receiver>>, NotifyError> {
    let http = reqwest::Client::builder()
        .timeout(DELIVERY_TIMEOUT)
        .build()?;

    let mut receivers: Vec<Arc<dyn Receiver>> = Vec::new();
    for pc in &cfg.pushover {
        receivers.push(Arc::new(PushoverReceiver::new(pc, http.clone())));
    }
    for wc in &cfg.webhook {
        receivers.push(Arc::new(WebhookReceiver::new(wc, http.clone())));
    }
    Ok(receivers)
}
