//! Harness settings file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::Result;

/// Main settings structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct HarnessSettings {
    /// Session publishing settings
    #[serde(default)]
    pub sessions: SessionSettings,

    /// Event delivery settings
    #[serde(default)]
    pub delivery: DeliverySettings,
}

/// Session publishing settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// How often the session tracker publishes pending sessions
    #[serde(default = "default_publish_interval")]
    pub publish_interval_ms: u64,

    /// How long to wait after starting a session before exiting
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            publish_interval_ms: default_publish_interval(),
            settle_ms: default_settle(),
        }
    }
}

impl SessionSettings {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

fn default_publish_interval() -> u64 {
    20
}
fn default_settle() -> u64 {
    100
}

/// Event delivery settings
#[derive(Debug, Deserialize, Clone)]
pub struct DeliverySettings {
    /// Timeout for a single HTTP delivery attempt
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl DeliverySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    10
}

impl HarnessSettings {
    /// Load settings from an optional TOML file
    ///
    /// Returns default settings when no path is given. A path that does not
    /// exist is an error, since it was asked for explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::SettingsParse(e.to_string()))
    }
}
