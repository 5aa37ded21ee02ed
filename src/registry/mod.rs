//! Watcher registry — construction-time wiring and signal routing
//!
//! Built once at startup from the configuration, then shared (read-only)
//! with the HTTP layer. Routing an inbound liveness signal to its watcher
//! compares the presented token against every configured app token in
//! constant time, with no early exit, so neither token validity nor match
//! position leaks through timing.

use crate::config::{Config, ConfigError};
use crate::notify::Receiver;
use crate::watch::{WatchStatus, Watcher};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::info;

/// Result of routing one inbound liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The token matched a watcher and the signal was recorded
    Accepted,
    /// No watcher matched; nothing changed
    UnknownToken,
}

/// Owns every watcher for the process lifetime.
#[derive(Debug)]
pub struct WatcherRegistry {
    watchers: Vec<Arc<Watcher>>,
}

impl WatcherRegistry {
    /// Construct one watcher per configured app, resolving each app's
    /// receiver names against the constructed receiver instances.
    ///
    /// Fails on the first dangling receiver reference or unparseable
    /// duration; nothing is started on failure.
    pub fn build(
        config: &Config,
        receivers: &[Arc<dyn Receiver>],
    ) -> Result<Self, ConfigError> {
        let mut watchers = Vec::with_capacity(config.apps.len());

        for app in &config.apps {
            let mut resolved: Vec<Arc<dyn Receiver>> = Vec::with_capacity(app.notify.len());
            for wanted in &app.notify {
                let receiver = receivers
                    .iter()
                    .find(|r| r.name() == wanted)
                    .ok_or_else(|| ConfigError::UnknownReceiver {
                        app: app.name.clone(),
                        receiver: wanted.clone(),
                    })?;
                resolved.push(Arc::clone(receiver));
            }
            watchers.push(Arc::new(Watcher::new(app, resolved)?));
        }

        Ok(Self { watchers })
    }

    /// Start every watcher's monitoring loop exactly once.
    pub fn start_all(&self) {
        for watcher in &self.watchers {
            watcher.start();
        }
        info!(watchers = self.watchers.len(), "All watchers started");
    }

    /// Route an inbound liveness signal by its secret token.
    ///
    /// Every registered token is compared unconditionally so the total cost
    /// is independent of where (or whether) a match occurs.
    pub fn handle_live_sign(&self, token: &str) -> SignalOutcome {
        let mut matched: Option<&Arc<Watcher>> = None;
        for watcher in &self.watchers {
            if bool::from(watcher.token().as_bytes().ct_eq(token.as_bytes())) {
                matched = Some(watcher);
            }
        }

        match matched {
            Some(watcher) => {
                watcher.handle_live_sign();
                SignalOutcome::Accepted
            }
            None => SignalOutcome::UnknownToken,
        }
    }

    /// Liveness snapshot of every watcher, in configuration order.
    pub fn statuses(&self) -> Vec<WatchStatus> {
        self.watchers.iter().map(|w| w.status()).collect()
    }

    /// Number of registered watchers.
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}
