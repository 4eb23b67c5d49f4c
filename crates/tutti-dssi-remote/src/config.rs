//! Connection settings for the plugin server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overrides [`BridgeConfig::socket_path`].
pub const SOCKET_ENV: &str = "TUTTI_DSSI_SOCKET";

/// Overrides [`BridgeConfig::connect_timeout_ms`].
pub const CONNECT_TIMEOUT_ENV: &str = "TUTTI_DSSI_CONNECT_TIMEOUT_MS";

fn default_connect_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Unix socket the plugin server listens on.
    pub socket_path: PathBuf,
    /// Upper bound for establishing a connection. Calls on an open channel are not bounded.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: std::env::temp_dir().join("tutti-dssi-vst.sock"),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    /// Defaults, overridden by `TUTTI_DSSI_SOCKET` and `TUTTI_DSSI_CONNECT_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(SOCKET_ENV).filter(|p| !p.is_empty()) {
            config.socket_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.connect_timeout_ms = ms,
                Err(_) => tracing::warn!(
                    "Ignoring {}={:?}: not a number of milliseconds",
                    CONNECT_TIMEOUT_ENV,
                    raw
                ),
            }
        }

        config
    }

    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }
}
