//! Agent runtime process spawner.
//!
//! The runtime is started with piped stdio and `kill_on_drop(true)`. It must
//! print one ready line on stdout before anything else; if that line does not
//! arrive within the configured window the process is killed and
//! `AppError::Acp("startup timeout …")` is returned.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::{AppError, Result};

/// Environment variable telling the runtime where spilled resources live.
pub const CACHE_DIR_ENV: &str = "OPENHANDS_ACP_CACHE_DIR";

/// Configuration for spawning the agent runtime.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Runtime executable.
    pub command: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Resource cache directory exported to the child.
    pub cache_dir: PathBuf,
    /// Maximum time to wait for the ready line.
    pub startup_timeout: Duration,
}

/// Active stdio connection to the spawned runtime.
///
/// `child` must be kept alive for the lifetime of the bridge; dropping it
/// kills the process.
#[derive(Debug)]
pub struct RuntimeConnection {
    /// Child process handle.
    pub child: Child,
    /// Runtime stdin, receives NDJSON commands.
    pub stdin: ChildStdin,
    /// Buffered runtime stdout, positioned after the ready line.
    pub stdout: BufReader<ChildStdout>,
}

/// Spawn the agent runtime and wait for its ready line.
///
/// Stderr is inherited so runtime diagnostics land next to the bridge's own
/// logs instead of corrupting the protocol stream.
///
/// # Errors
///
/// - `AppError::Acp("failed to spawn runtime: …")` on OS spawn failure.
/// - `AppError::Acp("startup timeout …")` when no ready line arrives in time.
/// - `AppError::Acp("runtime exited before ready signal")` on early EOF.
pub async fn spawn_runtime(config: &SpawnConfig) -> Result<RuntimeConnection> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .env(CACHE_DIR_ENV, &config.cache_dir)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::inherit())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|err| AppError::Acp(format!("failed to spawn runtime: {err}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Acp("failed to capture runtime stdin".into()))?;
    let stdout_raw = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Acp("failed to capture runtime stdout".into()))?;

    let mut reader = BufReader::new(stdout_raw);
    let mut line = String::new();

    match tokio::time::timeout(config.startup_timeout, reader.read_line(&mut line)).await {
        Ok(Ok(n)) if n > 0 => {
            info!(
                command = config.command.as_str(),
                ready_line = line.trim(),
                "runtime emitted ready signal"
            );
        }
        Ok(Ok(_)) => {
            return Err(AppError::Acp("runtime exited before ready signal".into()));
        }
        Ok(Err(err)) => {
            return Err(AppError::Acp(format!(
                "failed to read runtime ready signal: {err}"
            )));
        }
        Err(_elapsed) => {
            child.kill().await.ok();
            return Err(AppError::Acp(format!(
                "startup timeout: runtime did not emit ready signal within {:?}",
                config.startup_timeout
            )));
        }
    }

    Ok(RuntimeConnection {
        child,
        stdin,
        stdout: reader,
    })
}
