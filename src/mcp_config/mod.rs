//! MCP server configuration (`mcp.json`).
//!
//! The file is shaped `{"mcpServers": {name: server}}`. A server is either a
//! local stdio process or a remote HTTP/SSE endpoint; the variant is decided
//! by whether the entry has a `command` or a `url`.

pub mod store;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// How the agent reaches an MCP server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Child process over stdio.
    Stdio,
    /// Streamable HTTP.
    Http,
    /// Server-sent events.
    Sse,
}

impl Transport {
    fn stdio() -> Self {
        Self::Stdio
    }

    fn http() -> Self {
        Self::Http
    }
}

impl FromStr for Transport {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "sse" => Ok(Self::Sse),
            other => Err(AppError::McpConfig(format!(
                "Invalid transport type '{other}': expected one of stdio, http, sse"
            ))),
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        };
        f.write_str(name)
    }
}

fn default_true() -> bool {
    true
}

/// Server launched as a local child process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StdioServer {
    /// Executable.
    pub command: String,
    /// Arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Always `stdio`.
    #[serde(default = "Transport::stdio")]
    pub transport: Transport,
    /// Whether the agent should load this server.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Server reached over the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteServer {
    /// Endpoint URL.
    pub url: String,
    /// `http` or `sse`.
    #[serde(default = "Transport::http")]
    pub transport: Transport,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Authentication scheme, e.g. `oauth`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Whether the agent should load this server.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One configured MCP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum McpServer {
    /// Local stdio server.
    Stdio(StdioServer),
    /// Remote HTTP/SSE server.
    Remote(RemoteServer),
}

impl McpServer {
    /// Whether the server is enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        match self {
            Self::Stdio(server) => server.enabled,
            Self::Remote(server) => server.enabled,
        }
    }

    /// Toggle the enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Self::Stdio(server) => server.enabled = enabled,
            Self::Remote(server) => server.enabled = enabled,
        }
    }

    /// Transport in use.
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self {
            Self::Stdio(server) => server.transport,
            Self::Remote(server) => server.transport,
        }
    }

    /// Command line or URL, for display.
    #[must_use]
    pub fn target(&self) -> String {
        match self {
            Self::Stdio(server) if server.args.is_empty() => server.command.clone(),
            Self::Stdio(server) => format!("{} {}", server.command, server.args.join(" ")),
            Self::Remote(server) => server.url.clone(),
        }
    }
}

/// Parsed contents of `mcp.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpConfig {
    /// Servers by name.
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, McpServer>,
}

/// Parse `Key: Value` header strings.
///
/// # Errors
///
/// Returns `AppError::McpConfig("Invalid header format …")` for entries
/// without a colon or with an empty key.
pub fn parse_headers(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .ok_or_else(|| {
                    AppError::McpConfig(format!(
                        "Invalid header format '{entry}': expected 'Key: Value'"
                    ))
                })
        })
        .collect()
}

/// Parse `KEY=VALUE` environment strings.
///
/// # Errors
///
/// Returns `AppError::McpConfig("Invalid environment variable format …")`
/// for entries without `=` or with an empty key.
pub fn parse_env_vars(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
                .ok_or_else(|| {
                    AppError::McpConfig(format!(
                        "Invalid environment variable format '{entry}': expected 'KEY=VALUE'"
                    ))
                })
        })
        .collect()
}
