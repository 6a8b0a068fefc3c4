//! Unit tests for the MCP server configuration store.
//!
//! Every test works on an `mcp.json` inside its own temporary directory.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use openhands_acp::mcp_config::store::{McpConfigStore, ServerSpec};
use openhands_acp::mcp_config::{parse_env_vars, parse_headers, McpServer, Transport};
use openhands_acp::AppError;

fn store() -> (TempDir, McpConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = McpConfigStore::new(dir.path().join("mcp.json"));
    (dir, store)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn mcp_error(result: openhands_acp::Result<()>) -> String {
    match result {
        Err(AppError::McpConfig(msg)) => msg,
        other => panic!("expected McpConfig error, got: {other:?}"),
    }
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Headers split on the first colon and trim both sides.
#[test]
fn headers_parse() {
    let parsed = parse_headers(&strings(&[
        "Authorization: Bearer token",
        "X-Url: https://example.com:8080",
    ]))
    .unwrap();

    assert_eq!(parsed["Authorization"], "Bearer token");
    assert_eq!(parsed["X-Url"], "https://example.com:8080");
}

/// Headers without a colon are rejected.
#[test]
fn headers_without_colon_are_rejected() {
    match parse_headers(&strings(&["InvalidHeader"])) {
        Err(AppError::McpConfig(msg)) => assert!(msg.contains("Invalid header format")),
        other => panic!("expected error, got: {other:?}"),
    }
}

/// Environment entries split on the first `=` and keep the rest verbatim.
#[test]
fn env_vars_parse() {
    let parsed = parse_env_vars(&strings(&["API_KEY=secret", "URL=a=b"])).unwrap();

    assert_eq!(parsed["API_KEY"], "secret");
    assert_eq!(parsed["URL"], "a=b");
}

/// Environment entries without `=` or with an empty key are rejected.
#[test]
fn env_vars_without_equals_are_rejected() {
    for bad in ["INVALID", "=value"] {
        match parse_env_vars(&strings(&[bad])) {
            Err(AppError::McpConfig(msg)) => {
                assert!(msg.contains("Invalid environment variable format"), "got: {msg}");
            }
            other => panic!("expected error for {bad}, got: {other:?}"),
        }
    }
}

/// Transports parse from their lowercase names only.
#[test]
fn transport_parses() {
    assert_eq!("stdio".parse::<Transport>().unwrap(), Transport::Stdio);
    assert_eq!("http".parse::<Transport>().unwrap(), Transport::Http);
    assert_eq!("sse".parse::<Transport>().unwrap(), Transport::Sse);
    assert!(matches!(
        "websocket".parse::<Transport>(),
        Err(AppError::McpConfig(msg)) if msg.contains("Invalid transport type")
    ));
}

// ── Load / save ─────────────────────────────────────────────────────────────

/// A missing file loads as an empty configuration.
#[test]
fn missing_file_is_empty() {
    let (_dir, store) = store();

    assert!(store.load().unwrap().servers.is_empty());
    assert!(store.list_servers().unwrap().is_empty());
}

/// Invalid JSON is reported with the file path.
#[test]
fn invalid_json_is_an_error() {
    let (_dir, store) = store();
    fs::write(store.path(), "{ invalid json").unwrap();

    match store.load() {
        Err(AppError::McpConfig(msg)) => assert!(msg.contains("Invalid JSON"), "got: {msg}"),
        other => panic!("expected error, got: {other:?}"),
    }
}

/// Saving creates missing parent directories.
#[test]
fn save_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let store = McpConfigStore::new(dir.path().join("deep").join("mcp.json"));

    store
        .add_server(ServerSpec::new("fs", "stdio", "npx"))
        .unwrap();

    assert!(store.path().exists());
}

/// Existing files in the common hand-written shape load.
#[test]
fn hand_written_file_loads() {
    let (_dir, store) = store();
    let body = json!({
        "mcpServers": {
            "fetch": { "command": "uvx", "args": ["mcp-server-fetch"] },
            "notion": { "url": "https://mcp.notion.com/mcp", "auth": "oauth" }
        }
    });
    fs::write(store.path(), body.to_string()).unwrap();

    let servers = store.list_servers().unwrap();

    match &servers["fetch"] {
        McpServer::Stdio(server) => {
            assert_eq!(server.command, "uvx");
            assert_eq!(server.args, vec!["mcp-server-fetch"]);
            assert_eq!(server.transport, Transport::Stdio);
            assert!(server.enabled);
        }
        other => panic!("expected stdio server, got: {other:?}"),
    }
    match &servers["notion"] {
        McpServer::Remote(server) => {
            assert_eq!(server.transport, Transport::Http);
            assert_eq!(server.auth.as_deref(), Some("oauth"));
        }
        other => panic!("expected remote server, got: {other:?}"),
    }
}

// ── CRUD ────────────────────────────────────────────────────────────────────

/// A stdio server is stored with its arguments and environment.
#[test]
fn add_stdio_server() {
    let (_dir, store) = store();
    let mut spec = ServerSpec::new("test-server", "stdio", "python");
    spec.args = strings(&["-m", "test_server"]);
    spec.env_vars = strings(&["API_KEY=secret", "DEBUG=true"]);

    store.add_server(spec).unwrap();

    let McpServer::Stdio(server) = store.get_server("test-server").unwrap() else {
        panic!("expected stdio server");
    };
    assert_eq!(server.command, "python");
    assert_eq!(server.args, vec!["-m", "test_server"]);
    assert_eq!(server.env["API_KEY"], "secret");
    assert_eq!(server.env["DEBUG"], "true");
}

/// A remote server is stored with headers and auth.
#[test]
fn add_http_server() {
    let (_dir, store) = store();
    let mut spec = ServerSpec::new("http-server", "http", "https://api.example.com/mcp");
    spec.headers = strings(&["Authorization: Bearer token123"]);
    spec.auth = Some("oauth".into());

    store.add_server(spec).unwrap();

    let McpServer::Remote(server) = store.get_server("http-server").unwrap() else {
        panic!("expected remote server");
    };
    assert_eq!(server.url, "https://api.example.com/mcp");
    assert_eq!(server.transport, Transport::Http);
    assert_eq!(server.headers["Authorization"], "Bearer token123");
    assert_eq!(server.auth.as_deref(), Some("oauth"));
}

/// The file on disk uses the `mcpServers` key.
#[test]
fn saved_file_shape() {
    let (_dir, store) = store();
    store
        .add_server(ServerSpec::new("sse-server", "sse", "https://sse.example.com"))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

    assert_eq!(
        raw["mcpServers"]["sse-server"],
        json!({ "url": "https://sse.example.com", "transport": "sse", "enabled": true })
    );
}

/// Adding an existing name fails and leaves the original alone.
#[test]
fn duplicate_name_is_rejected() {
    let (_dir, store) = store();
    store.add_server(ServerSpec::new("dup", "stdio", "a")).unwrap();

    let msg = mcp_error(store.add_server(ServerSpec::new("dup", "stdio", "b")));

    assert!(msg.contains("already exists"), "got: {msg}");
    assert_eq!(store.get_server("dup").unwrap().target(), "a");
}

/// Invalid transports and malformed entries fail before anything is written.
#[test]
fn invalid_specs_write_nothing() {
    let (_dir, store) = store();

    let msg = mcp_error(store.add_server(ServerSpec::new("x", "ftp", "a")));
    assert!(msg.contains("Invalid transport type"), "got: {msg}");

    let mut spec = ServerSpec::new("y", "http", "https://a");
    spec.headers = strings(&["NoColon"]);
    let msg = mcp_error(store.add_server(spec));
    assert!(msg.contains("Invalid header format"), "got: {msg}");

    assert!(!store.path().exists());
}

/// Removing deletes the entry; unknown names fail.
#[test]
fn remove_server() {
    let (_dir, store) = store();
    store.add_server(ServerSpec::new("gone", "stdio", "a")).unwrap();

    store.remove_server("gone").unwrap();

    assert!(!store.server_exists("gone"));
    let msg = mcp_error(store.remove_server("gone"));
    assert!(msg.contains("not found"), "got: {msg}");
}

/// Fetching an unknown name fails.
#[test]
fn get_unknown_server() {
    let (_dir, store) = store();

    match store.get_server("nope") {
        Err(AppError::McpConfig(msg)) => assert!(msg.contains("Server 'nope' not found")),
        other => panic!("expected error, got: {other:?}"),
    }
}

// ── Enable / disable ────────────────────────────────────────────────────────

/// Servers toggle between enabled and disabled and filter accordingly.
#[test]
fn enable_and_disable() {
    let (_dir, store) = store();
    store.add_server(ServerSpec::new("a", "stdio", "a")).unwrap();
    store.add_server(ServerSpec::new("b", "stdio", "b")).unwrap();

    store.disable_server("a").unwrap();

    assert!(!store.is_server_enabled("a"));
    assert!(store.is_server_enabled("b"));
    let enabled = store.list_enabled_servers().unwrap();
    assert_eq!(enabled.keys().collect::<Vec<_>>(), vec!["b"]);

    store.enable_server("a").unwrap();
    assert!(store.is_server_enabled("a"));
    assert_eq!(store.list_enabled_servers().unwrap().len(), 2);
}

/// A server added disabled stays out of the enabled list.
#[test]
fn add_disabled_server() {
    let (_dir, store) = store();
    let mut spec = ServerSpec::new("off", "http", "https://a");
    spec.enabled = false;

    store.add_server(spec).unwrap();

    assert!(store.server_exists("off"));
    assert!(!store.is_server_enabled("off"));
    assert!(store.list_enabled_servers().unwrap().is_empty());
}

/// Toggling an unknown server fails.
#[test]
fn toggle_unknown_server() {
    let (_dir, store) = store();

    assert!(mcp_error(store.enable_server("x")).contains("not found"));
    assert!(mcp_error(store.disable_server("x")).contains("not found"));
}

/// Predicates treat an unreadable file as empty.
#[test]
fn predicates_on_invalid_file() {
    let (_dir, store) = store();
    fs::write(store.path(), "not json").unwrap();

    assert!(!store.server_exists("a"));
    assert!(!store.is_server_enabled("a"));
}

// ── Status ──────────────────────────────────────────────────────────────────

/// Status distinguishes missing, valid, and invalid files.
#[test]
fn config_status_reports() {
    let (_dir, store) = store();

    let missing = store.config_status();
    assert!(!missing.exists);
    assert!(!missing.valid);
    assert!(missing.message.contains("not found"));

    store.add_server(ServerSpec::new("a", "stdio", "a")).unwrap();
    let valid = store.config_status();
    assert!(valid.exists && valid.valid);
    assert_eq!(valid.servers.len(), 1);
    assert_eq!(valid.message, "Valid MCP configuration with 1 server(s)");

    fs::write(store.path(), "{ invalid").unwrap();
    let invalid = store.config_status();
    assert!(invalid.exists);
    assert!(!invalid.valid);
    assert!(invalid.servers.is_empty());
    assert!(invalid.message.starts_with("Invalid MCP configuration"));
}

/// Display helpers render transport and target.
#[test]
fn server_display_helpers() {
    let (_dir, store) = store();
    let mut spec = ServerSpec::new("fs", "stdio", "npx");
    spec.args = strings(&["-y", "@mcp/fs"]);
    store.add_server(spec).unwrap();

    let server = store.get_server("fs").unwrap();

    assert_eq!(server.transport().to_string(), "stdio");
    assert_eq!(server.target(), "npx -y @mcp/fs");
}
