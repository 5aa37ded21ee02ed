//! Watcher — the per-app dead man's switch state machine
//!
//! Each watcher tracks the time since its app's last liveness signal and
//! races a cancellable timer against signal arrival:
//!
//! - While **alive**, the loop waits out the configured timeout. If no
//!   signal interrupts it, the app is marked dead and a down alert is
//!   dispatched.
//! - While **dead**, the loop waits out the (shorter) repeat interval and
//!   re-alerts on every expiry, producing a steady drumbeat until the app
//!   checks in again.
//! - A liveness signal at any point cancels the pending wait; if the app
//!   was dead, a single back alert is dispatched.
//!
//! Notification dispatch is fire-and-forget: the loop never waits for a
//! delivery result before re-arming, and per-receiver failures are logged
//! and dropped.

use crate::config::AppConfig;
use crate::notify::Receiver;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Mutable liveness state, guarded by the watcher's mutex.
///
/// The lock is held only for short read/update sections, never across an
/// await or a delivery attempt.
struct WatchState {
    /// Monotonic timestamp of the most recent accepted signal
    /// (construction time until the first signal arrives)
    last_live_sign: Instant,
    /// Wall-clock counterpart, for status reporting
    last_live_sign_at: DateTime<Utc>,
    /// True while the app is considered dead
    timeout_exceeded: bool,
}

/// Point-in-time snapshot of one watcher, for status reporting.
#[derive(Debug, Clone)]
pub struct WatchStatus {
    /// App name
    pub app: String,
    /// False while the app is considered dead
    pub alive: bool,
    /// Wall-clock time of the last accepted signal
    pub last_live_sign: DateTime<Utc>,
    /// Time elapsed since the last accepted signal
    pub since_last_sign: Duration,
}

/// Dead man's switch for a single application.
///
/// Created once at startup from its [`AppConfig`] and the resolved receiver
/// list; the monitoring loop runs until process exit.
pub struct Watcher {
    name: String,
    token: String,
    timeout: Duration,
    repeat_interval: Duration,
    receivers: Vec<Arc<dyn Receiver>>,

    state: Mutex<WatchState>,
    /// Interrupts the armed wait. `notify_one` stores a permit, so a signal
    /// landing between loop iterations still cancels the very next wait.
    live_sign: Notify,
    started: AtomicBool,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("repeat_interval", &self.repeat_interval)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Build a watcher from its app config and resolved receivers.
    ///
    /// Fails if either duration string is unparseable; the error names the
    /// app, so startup aborts with an actionable message.
    pub fn new(
        app: &AppConfig,
        receivers: Vec<Arc<dyn Receiver>>,
    ) -> Result<Self, crate::config::ConfigError> {
        let timeout = app.parse_timeout()?;
        let repeat_interval = app.parse_repeat_interval()?;

        Ok(Self {
            name: app.name.clone(),
            token: app.token.clone(),
            timeout,
            repeat_interval,
            receivers,
            state: Mutex::new(WatchState {
                last_live_sign: Instant::now(),
                last_live_sign_at: Utc::now(),
                timeout_exceeded: false,
            }),
            live_sign: Notify::new(),
            started: AtomicBool::new(false),
        })
    }

    /// App name (the display and log key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Secret token the app authenticates its signals with.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Spawn the monitoring loop. Subsequent calls are no-ops.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!(app = %self.name, "Watcher already started — ignoring");
            return;
        }
        info!(app = %self.name, timeout = ?self.timeout, "Watching app");
        let watcher = Arc::clone(self);
        tokio::spawn(async move { watcher.watch().await });
    }

    /// Accept a liveness signal.
    ///
    /// Records the signal time, cancels the armed wait so the loop
    /// re-arms from fresh state, and — when the app was dead — clears the
    /// dead flag and dispatches back alerts without blocking the caller.
    ///
    /// Safe under concurrent invocation; signals while already alive are
    /// idempotent.
    pub fn handle_live_sign(self: &Arc<Self>) {
        let was_dead = {
            let mut state = self.lock_state();
            state.last_live_sign = Instant::now();
            state.last_live_sign_at = Utc::now();
            std::mem::replace(&mut state.timeout_exceeded, false)
        };
        self.live_sign.notify_one();
        debug!(app = %self.name, "Live sign accepted");

        if was_dead {
            info!(app = %self.name, "App has risen from the dead, welcome back!");
            let watcher = Arc::clone(self);
            tokio::spawn(async move { watcher.dispatch_back().await });
        }
    }

    /// Current liveness snapshot.
    pub fn status(&self) -> WatchStatus {
        let state = self.lock_state();
        WatchStatus {
            app: self.name.clone(),
            alive: !state.timeout_exceeded,
            last_live_sign: state.last_live_sign_at,
            since_last_sign: state.last_live_sign.elapsed(),
        }
    }

    /// The monitoring loop. Runs forever; nothing in it is fatal.
    async fn watch(self: Arc<Self>) {
        loop {
            // Re-arm from fresh state: the timeout while alive, the repeat
            // cadence while dead.
            let wait = {
                let state = self.lock_state();
                if state.timeout_exceeded {
                    self.repeat_interval
                } else {
                    self.timeout
                }
            };
            let armed_at = Instant::now();

            tokio::select! {
                () = tokio::time::sleep(wait) => {
                    if let Some(downtime) = self.on_expiry(armed_at) {
                        let watcher = Arc::clone(&self);
                        tokio::spawn(async move { watcher.dispatch_down(downtime).await });
                    }
                }
                () = self.live_sign.notified() => {
                    // Wait cancelled by a signal; the dropped sleep cannot
                    // fire late. Loop around and re-evaluate.
                }
            }
        }
    }

    /// Handle a timer expiry. Returns the downtime to alert with, or `None`
    /// when a signal recorded after arming makes this expiry a false alarm.
    fn on_expiry(&self, armed_at: Instant) -> Option<Duration> {
        let mut state = self.lock_state();
        if state.last_live_sign > armed_at {
            // A signal raced the expiry and won; its permit will cancel the
            // next wait immediately and the loop re-arms from alive state.
            return None;
        }
        if !state.timeout_exceeded {
            state.timeout_exceeded = true;
            info!(app = %self.name, "Timeout reached. The app has probably died.");
        }
        Some(state.last_live_sign.elapsed())
    }

    /// Alert every receiver that the app is (still) down. Failures are
    /// logged per receiver and never interrupt the fan-out.
    async fn dispatch_down(self: Arc<Self>, downtime: Duration) {
        info!(
            app = %self.name,
            downtime_secs = downtime.as_secs(),
            "Notifying receivers that the app is (still) down"
        );
        for receiver in &self.receivers {
            if let Err(e) = receiver.notify_app_down(&self.name, downtime).await {
                warn!(
                    app = %self.name,
                    receiver = receiver.name(),
                    error = %e,
                    "Sending app-down notification failed"
                );
            }
        }
    }

    /// Alert every receiver that the app is back.
    async fn dispatch_back(self: Arc<Self>) {
        info!(app = %self.name, "Notifying receivers that the app is back");
        for receiver in &self.receivers {
            if let Err(e) = receiver.notify_app_back(&self.name).await {
                warn!(
                    app = %self.name,
                    receiver = receiver.name(),
                    error = %e,
                    "Sending app-back notification failed"
                );
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!(app = %self.name, "Watcher state mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
