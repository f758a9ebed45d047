//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client runs in local mode with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use unmask_remote::{FirestoreOptions, RemoteConfig};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote store credentials; placeholders keep the client local-only.
    pub remote: RemoteConfig,

    /// Directory holding the local store.
    /// Env: `UNMASK_DATA_DIR`
    /// Default: platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Also apply successful remote writes to the local store.
    /// Env: `UNMASK_MIRROR_WRITES` (true/false)
    /// Default: `true`
    pub mirror_writes: bool,

    /// Poll interval of live message queries.
    /// Env: `UNMASK_WATCH_INTERVAL_MS`
    /// Default: `2000`
    pub watch_interval: Duration,

    /// Per-request timeout of remote calls.
    /// Env: `UNMASK_REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            data_dir: None,
            mirror_writes: true,
            watch_interval: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self {
            remote: RemoteConfig::from_env(),
            ..Self::default()
        };

        if let Ok(dir) = std::env::var("UNMASK_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(val) = std::env::var("UNMASK_MIRROR_WRITES") {
            match parse_bool(&val) {
                Some(b) => config.mirror_writes = b,
                None => tracing::warn!(value = %val, "Invalid UNMASK_MIRROR_WRITES, using default"),
            }
        }

        if let Ok(val) = std::env::var("UNMASK_WATCH_INTERVAL_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.watch_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid UNMASK_WATCH_INTERVAL_MS, using default"),
            }
        }

        if let Ok(val) = std::env::var("UNMASK_REQUEST_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid UNMASK_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        config
    }

    pub fn firestore_options(&self) -> FirestoreOptions {
        FirestoreOptions {
            request_timeout: self.request_timeout,
            watch_interval: self.watch_interval,
            ..FirestoreOptions::default()
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
