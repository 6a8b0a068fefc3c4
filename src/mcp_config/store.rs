//! File-backed CRUD over `mcp.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{
    parse_env_vars, parse_headers, McpConfig, McpServer, RemoteServer, StdioServer, Transport,
};
use crate::{AppError, Result};

/// Arguments for [`McpConfigStore::add_server`].
#[derive(Debug, Clone)]
pub struct ServerSpec {
    /// Unique server name.
    pub name: String,
    /// `stdio`, `http`, or `sse`.
    pub transport: String,
    /// Command for stdio servers, URL for remote ones.
    pub target: String,
    /// Command arguments (stdio only).
    pub args: Vec<String>,
    /// `KEY=VALUE` entries (stdio only).
    pub env_vars: Vec<String>,
    /// `Key: Value` entries (remote only).
    pub headers: Vec<String>,
    /// Authentication scheme (remote only).
    pub auth: Option<String>,
    /// Initial enabled flag.
    pub enabled: bool,
}

impl ServerSpec {
    /// Enabled server with no arguments, environment, headers, or auth.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        transport: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            transport: transport.into(),
            target: target.into(),
            args: Vec::new(),
            env_vars: Vec::new(),
            headers: Vec::new(),
            auth: None,
            enabled: true,
        }
    }
}

/// Health report for the configuration file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigStatus {
    /// The file exists.
    pub exists: bool,
    /// The file parsed successfully.
    pub valid: bool,
    /// Servers found; empty unless `valid`.
    pub servers: BTreeMap<String, McpServer>,
    /// Human-readable summary.
    pub message: String,
}

/// MCP configuration store rooted at one JSON file.
#[derive(Debug, Clone)]
pub struct McpConfigStore {
    path: PathBuf,
}

impl McpConfigStore {
    /// Store backed by `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration. A missing file yields an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::McpConfig` for unreadable files or invalid JSON.
    pub fn load(&self) -> Result<McpConfig> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "mcp config not found, using empty config");
            return Ok(McpConfig::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|err| {
            AppError::McpConfig(format!("failed to read {}: {err}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            AppError::McpConfig(format!("Invalid JSON in {}: {err}", self.path.display()))
        })
    }

    /// Write the configuration, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `AppError::McpConfig` if the file cannot be written.
    pub fn save(&self, config: &McpConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::McpConfig(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        let body = serde_json::to_string_pretty(config)
            .map_err(|err| AppError::McpConfig(format!("failed to serialise config: {err}")))?;
        fs::write(&self.path, body).map_err(|err| {
            AppError::McpConfig(format!("failed to write {}: {err}", self.path.display()))
        })
    }

    /// Add a new server.
    ///
    /// # Errors
    ///
    /// - `"Server '…' already exists"` for duplicate names.
    /// - `"Invalid transport type …"` for unknown transports.
    /// - header / environment parse errors.
    pub fn add_server(&self, spec: ServerSpec) -> Result<()> {
        let transport: Transport = spec.transport.parse()?;
        let mut config = self.load()?;
        if config.servers.contains_key(&spec.name) {
            return Err(AppError::McpConfig(format!(
                "Server '{}' already exists",
                spec.name
            )));
        }

        let server = match transport {
            Transport::Stdio => McpServer::Stdio(StdioServer {
                command: spec.target,
                args: spec.args,
                env: parse_env_vars(&spec.env_vars)?,
                transport,
                enabled: spec.enabled,
            }),
            Transport::Http | Transport::Sse => McpServer::Remote(RemoteServer {
                url: spec.target,
                transport,
                headers: parse_headers(&spec.headers)?,
                auth: spec.auth,
                enabled: spec.enabled,
            }),
        };

        config.servers.insert(spec.name.clone(), server);
        self.save(&config)?;
        info!(name = spec.name.as_str(), %transport, "mcp server added");
        Ok(())
    }

    /// Remove a server.
    ///
    /// # Errors
    ///
    /// Returns `"Server '…' not found"` for unknown names.
    pub fn remove_server(&self, name: &str) -> Result<()> {
        let mut config = self.load()?;
        if config.servers.remove(name).is_none() {
            return Err(not_found(name));
        }
        self.save(&config)?;
        info!(name, "mcp server removed");
        Ok(())
    }

    /// Fetch one server.
    ///
    /// # Errors
    ///
    /// Returns `"Server '…' not found"` for unknown names.
    pub fn get_server(&self, name: &str) -> Result<McpServer> {
        self.load()?
            .servers
            .remove(name)
            .ok_or_else(|| not_found(name))
    }

    /// All servers by name.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load`] errors.
    pub fn list_servers(&self) -> Result<BTreeMap<String, McpServer>> {
        Ok(self.load()?.servers)
    }

    /// Enabled servers by name.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::load`] errors.
    pub fn list_enabled_servers(&self) -> Result<BTreeMap<String, McpServer>> {
        let mut servers = self.list_servers()?;
        servers.retain(|_, server| server.enabled());
        Ok(servers)
    }

    /// Whether `name` is configured. An unreadable file counts as empty.
    #[must_use]
    pub fn server_exists(&self, name: &str) -> bool {
        self.load()
            .is_ok_and(|config| config.servers.contains_key(name))
    }

    /// Whether `name` is configured and enabled.
    #[must_use]
    pub fn is_server_enabled(&self, name: &str) -> bool {
        self.load()
            .is_ok_and(|config| config.servers.get(name).is_some_and(McpServer::enabled))
    }

    /// Mark a server enabled.
    ///
    /// # Errors
    ///
    /// Returns `"Server '…' not found"` for unknown names.
    pub fn enable_server(&self, name: &str) -> Result<()> {
        self.set_enabled(name, true)
    }

    /// Mark a server disabled.
    ///
    /// # Errors
    ///
    /// Returns `"Server '…' not found"` for unknown names.
    pub fn disable_server(&self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }

    /// Describe the file's state without failing.
    #[must_use]
    pub fn config_status(&self) -> ConfigStatus {
        if !self.path.exists() {
            return ConfigStatus {
                exists: false,
                valid: false,
                servers: BTreeMap::new(),
                message: format!("Configuration file not found: {}", self.path.display()),
            };
        }
        match self.load() {
            Ok(config) => ConfigStatus {
                exists: true,
                valid: true,
                message: format!(
                    "Valid MCP configuration with {} server(s)",
                    config.servers.len()
                ),
                servers: config.servers,
            },
            Err(err) => ConfigStatus {
                exists: true,
                valid: false,
                servers: BTreeMap::new(),
                message: format!("Invalid MCP configuration: {err}"),
            },
        }
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let mut config = self.load()?;
        let server = config.servers.get_mut(name).ok_or_else(|| not_found(name))?;
        server.set_enabled(enabled);
        self.save(&config)?;
        info!(name, enabled, "mcp server toggled");
        Ok(())
    }
}

fn not_found(name: &str) -> AppError {
    AppError::McpConfig(format!("Server '{name}' not found"))
}
