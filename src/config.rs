//! Global configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Agent runtime process settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RuntimeConfig {
    /// Executable that runs the agent runtime and speaks NDJSON on stdio.
    #[serde(default = "default_runtime_command")]
    pub command: String,
    /// Arguments passed to the runtime executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Maximum time to wait for the runtime's ready line.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: default_runtime_command(),
            args: Vec::new(),
            startup_timeout_seconds: default_startup_timeout(),
        }
    }
}

/// Translation pipeline settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Depth of each per-session inbound channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Attach the metrics metadata block to outbound notifications.
    #[serde(default = "default_true")]
    pub emit_metrics: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            emit_metrics: true,
        }
    }
}

fn default_runtime_command() -> String {
    "openhands-runtime".into()
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_persistence_dir() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".openhands"), |home| home.join(".openhands"))
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// User-scoped persistence root (cache and MCP config live below it).
    #[serde(default = "default_persistence_dir")]
    pub persistence_dir: PathBuf,
    /// Agent runtime process settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Translation pipeline settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            persistence_dir: default_persistence_dir(),
            runtime: RuntimeConfig::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Directory where non-renderable binary resources are spilled.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.persistence_dir.join("cache").join("acp")
    }

    /// Path of the MCP server configuration file.
    #[must_use]
    pub fn mcp_config_path(&self) -> PathBuf {
        self.persistence_dir.join("mcp.json")
    }

    /// Runtime startup timeout as a [`Duration`].
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.startup_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.bridge.event_buffer == 0 {
            return Err(AppError::Config(
                "bridge.event_buffer must be greater than zero".into(),
            ));
        }

        if self.runtime.startup_timeout_seconds == 0 {
            return Err(AppError::Config(
                "runtime.startup_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.runtime.command.trim().is_empty() {
            return Err(AppError::Config("runtime.command must not be empty".into()));
        }

        Ok(())
    }
}
