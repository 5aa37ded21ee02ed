//! vigil: dead man's switch monitoring daemon
//!
//! Monitored applications periodically report "I'm still alive" over HTTP.
//! When an app goes silent for longer than its configured timeout, vigil
//! alerts the configured notification receivers and keeps re-alerting at a
//! fixed repeat interval until the app checks in again.
//!
//! ## Architecture
//!
//! - **Watcher**: per-app liveness state machine racing a cancellable timer
//!   against signal arrival
//! - **Registry**: resolves inbound signals to watchers by constant-time
//!   token comparison
//! - **Receivers**: pluggable notification sinks (Pushover, webhooks)
//! - **API**: axum HTTP surface for liveness signals and status

pub mod api;
pub mod config;
pub mod notify;
pub mod registry;
pub mod watch;

// Re-export the configuration root
pub use config::{AppConfig, Config, ConfigError};

// Re-export the notification contract
pub use notify::{NotifyError, Receiver};

// Re-export the core watcher types
pub use watch::{WatchStatus, Watcher};

// Re-export the registry
pub use registry::{SignalOutcome, WatcherRegistry};
