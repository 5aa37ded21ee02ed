//! Per-app liveness watching
//!
//! One [`Watcher`] per monitored application, each running an autonomous
//! monitoring loop for the lifetime of the process.

mod watcher;

pub use watcher::{WatchStatus, Watcher};
