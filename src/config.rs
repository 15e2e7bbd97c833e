// ABOUTME: Configuration for the bridge binary
// Defaults, then an optional TOML file, then command-line overrides

use crate::error::{BridgeError, Result};
use crate::socket::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Flask-SocketIO development server
pub const DEFAULT_URL: &str = "ws://127.0.0.1:5000";

/// Settings for one bridge session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Socket.IO server URL; the Engine.IO path is added when missing
    pub url: String,
    /// Delay between reconnection attempts
    pub reconnect_interval_ms: u64,
    /// Consecutive failed attempts before giving up
    pub max_reconnect_attempts: u32,
    /// How long startup waits for the first connection
    pub connect_timeout_ms: u64,
    /// Where log files go; `~/.termbridge/logs` when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect_interval_ms: 2000,
            max_reconnect_attempts: 10,
            connect_timeout_ms: 5000,
            log_dir: None,
        }
    }
}

/// Values given on the command line; `None` leaves the file/default value alone
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub reconnect_interval_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
    pub log_dir: Option<PathBuf>,
}

impl BridgeConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// `<config_dir>/termbridge/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("termbridge").join("config.toml"))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit `path` must exist; the default path is used only if present.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading config from {:?}", path);
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        let config = base.merge(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line values on top of this configuration
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(interval) = overrides.reconnect_interval_ms {
            self.reconnect_interval_ms = interval;
        }
        if let Some(attempts) = overrides.max_reconnect_attempts {
            self.max_reconnect_attempts = attempts;
        }
        if let Some(dir) = overrides.log_dir {
            self.log_dir = Some(dir);
        }
        self
    }

    /// Reject URLs that are not WebSocket URLs and a zero connect timeout
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(BridgeError::Config(format!(
                "url must use ws:// or wss://, got {}",
                self.url
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry settings for the client
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: Duration::from_millis(self.reconnect_interval_ms),
            max_attempts: self.max_reconnect_attempts,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }

    /// Configured log directory, or `~/.termbridge/logs`
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".termbridge").join("logs"))
                .unwrap_or_else(|| PathBuf::from(".termbridge/logs"))
        })
    }
}
