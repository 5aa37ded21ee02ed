//! Daemon Configuration
//!
//! Everything vigil watches and notifies is declared in a single TOML file:
//! the listen address, one `[[apps]]` entry per monitored application, and
//! the notification receivers the apps reference by name.
//!
//! ## Loading Order
//!
//! 1. Explicit path from the `--config` CLI flag
//! 2. `vigil.toml` in the current working directory
//! 3. `/etc/vigil/vigil.toml`
//!
//! Configuration errors are fatal at startup. No watcher is ever started
//! with an unparseable timeout or a dangling receiver reference; the error
//! message names the offending app or receiver.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// System-wide fallback config location.
const SYSTEM_CONFIG_PATH: &str = "/etc/vigil/vigil.toml";

/// Errors raised while loading or validating the configuration.
///
/// All variants are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no config file found (searched ./vigil.toml and {SYSTEM_CONFIG_PATH})")]
    NotFound,

    #[error("app \"{app}\": cannot parse {field} \"{value}\": {source}")]
    BadDuration {
        app: String,
        field: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    #[error("app \"{app}\": receiver \"{receiver}\" does not exist")]
    UnknownReceiver { app: String, receiver: String },
}

/// Root configuration for one vigil instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Monitored applications
    #[serde(default)]
    pub apps: Vec<AppConfig>,

    /// Notification receivers, grouped by type
    #[serde(default)]
    pub receivers: ReceiversConfig,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

/// One monitored application: identity, credentials, and timing.
///
/// Immutable for the process lifetime once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Display name, used as the log and notification key
    pub name: String,

    /// Secret token the app presents with each liveness signal
    pub token: String,

    /// Silence duration after which the app is considered dead ("30s", "5m")
    pub timeout: String,

    /// Cadence of repeated down alerts while the app stays dead
    pub repeat_interval: String,

    /// Names of the receivers to alert for this app
    #[serde(default)]
    pub notify: Vec<String>,
}

impl AppConfig {
    /// Parse the configured timeout into a [`Duration`].
    pub fn parse_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.timeout).map_err(|source| ConfigError::BadDuration {
            app: self.name.clone(),
            field: "timeout",
            value: self.timeout.clone(),
            source,
        })
    }

    /// Parse the configured repeat interval into a [`Duration`].
    pub fn parse_repeat_interval(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.repeat_interval).map_err(|source| {
            ConfigError::BadDuration {
                app: self.name.clone(),
                field: "repeat_interval",
                value: self.repeat_interval.clone(),
                source,
            }
        })
    }
}

/// Receiver declarations, one array per receiver type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiversConfig {
    /// Pushover receivers
    #[serde(default)]
    pub pushover: Vec<PushoverConfig>,

    /// Generic JSON webhook receivers
    #[serde(default)]
    pub webhook: Vec<WebhookConfig>,
}

/// A Pushover notification target.
#[derive(Debug, Clone, Deserialize)]
pub struct PushoverConfig {
    /// Name the apps reference in their `notify` list
    pub name: String,

    /// Pushover user key (recipient)
    pub user_key: String,

    /// Pushover application token
    pub token: String,

    /// Message priority (-2 to 2, Pushover semantics)
    #[serde(default)]
    pub priority: i8,
}

/// A generic webhook target receiving JSON notification events.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Name the apps reference in their `notify` list
    pub name: String,

    /// URL the notification event is POSTed to
    pub url: String,
}

impl Config {
    /// Load configuration using the standard search order.
    ///
    /// An explicit path must exist and parse; a missing file at a fallback
    /// location just moves the search along.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded configuration");
            return Ok(config);
        }

        for candidate in [Path::new("vigil.toml"), Path::new(SYSTEM_CONFIG_PATH)] {
            if candidate.exists() {
                let config = Self::load_from_file(candidate)?;
                info!(path = %candidate.display(), "Loaded configuration");
                return Ok(config);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// All declared receiver names, in declaration order.
    pub fn receiver_names(&self) -> Vec<&str> {
        self.receivers
            .pushover
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.receivers.webhook.iter().map(|r| r.name.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
listen = "127.0.0.1:9999"

[[apps]]
name = "nightly-backup"
token = "s3cret"
timeout = "30s"
repeat_interval = "5m"
notify = ["ops-pushover"]

[[apps]]
name = "payment-worker"
token = "0ther"
timeout = "1m 30s"
repeat_interval = "10m"
notify = ["ops-pushover", "ops-hook"]

[[receivers.pushover]]
name = "ops-pushover"
user_key = "uk"
token = "pk"
priority = 1

[[receivers.webhook]]
name = "ops-hook"
url = "https://hooks.example.com/vigil"
"#;

    #[test]
    fn sample_config_parses() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:9999");
        assert_eq!(cfg.apps.len(), 2);
        assert_eq!(cfg.apps[0].name, "nightly-backup");
        assert_eq!(cfg.apps[1].notify, vec!["ops-pushover", "ops-hook"]);
        assert_eq!(cfg.receivers.pushover.len(), 1);
        assert_eq!(cfg.receivers.pushover[0].priority, 1);
        assert_eq!(cfg.receivers.webhook[0].url, "https://hooks.example.com/vigil");
    }

    #[test]
    fn durations_parse_to_std_duration() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.apps[0].parse_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(
            cfg.apps[1].parse_timeout().unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            cfg.apps[0].parse_repeat_interval().unwrap(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn malformed_duration_names_the_app_and_field() {
        let cfg: Config = toml::from_str(
            r#"
[[apps]]
name = "broken"
token = "t"
timeout = "soon"
repeat_interval = "1m"
"#,
        )
        .unwrap();
        let err = cfg.apps[0].parse_timeout().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken"), "message should name the app: {msg}");
        assert!(msg.contains("timeout"), "message should name the field: {msg}");
        assert!(msg.contains("soon"), "message should echo the value: {msg}");
    }

    #[test]
    fn listen_defaults_when_omitted() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.listen, "0.0.0.0:8080");
        assert!(cfg.apps.is_empty());
    }

    #[test]
    fn receiver_names_cover_all_types() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.receiver_names(), vec!["ops-pushover", "ops-hook"]);
    }

    #[test]
    fn load_from_file_round_trips() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.apps.len(), 2);
    }

    #[test]
    fn load_prefers_the_explicit_path_over_the_search_order() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let cfg = Config::load(Some(f.path())).unwrap();
        // The explicit file was used, not a vigil.toml from the search
        // locations (which would not carry these apps).
        assert_eq!(cfg.listen, "127.0.0.1:9999");
        assert_eq!(cfg.apps.len(), 2);
    }

    #[test]
    fn load_with_missing_explicit_path_fails_instead_of_falling_back() {
        let err = Config::load(Some(Path::new("/nonexistent/vigil.toml"))).unwrap_err();
        // An explicit path must exist; a fallback here would silently
        // monitor the wrong apps.
        assert!(matches!(err, ConfigError::Read { .. }), "{err}");
        assert!(err.to_string().contains("/nonexistent/vigil.toml"));
    }

    #[test]
    fn load_from_missing_file_reports_path() {
        let err = Config::load_from_file(Path::new("/nonexistent/vigil.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vigil.toml"));
    }
}
