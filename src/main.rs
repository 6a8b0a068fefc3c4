#![forbid(unsafe_code)]

//! `openhands-acp`: Agent Client Protocol bridge binary.
//!
//! `acp` spawns the agent runtime and bridges it to an ACP client over this
//! process's stdio. `mcp` manages the MCP server configuration file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use openhands_acp::acp::spawner::{spawn_runtime, RuntimeConnection, SpawnConfig};
use openhands_acp::mcp_config::store::{McpConfigStore, ServerSpec};
use openhands_acp::mcp_config::McpServer;
use openhands_acp::orchestrator::serve;
use openhands_acp::{AppError, GlobalConfig, Result};

/// How long blocking stdio threads and the runtime child get to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "openhands-acp", about = "Agent Client Protocol bridge", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (default: ~/.openhands/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json). Logs always go to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve an ACP client on stdio.
    Acp(AcpArgs),
    /// Manage MCP server configuration.
    #[command(subcommand)]
    Mcp(McpCommand),
}

#[derive(Debug, Args)]
struct AcpArgs {
    /// Override the runtime executable from the config file.
    #[arg(long)]
    runtime_command: Option<String>,

    /// Arguments passed to the runtime (replace the configured ones).
    #[arg(last = true)]
    runtime_args: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum McpCommand {
    /// Add a server.
    Add {
        /// Server name.
        name: String,
        /// Transport: stdio, http, or sse.
        #[arg(long, default_value = "stdio")]
        transport: String,
        /// Command (stdio) or URL (http/sse).
        target: String,
        /// Command arguments (stdio).
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Environment variable as KEY=VALUE (stdio).
        #[arg(long = "env")]
        env_vars: Vec<String>,
        /// Request header as "Key: Value" (http/sse).
        #[arg(long = "header")]
        headers: Vec<String>,
        /// Authentication scheme, e.g. oauth (http/sse).
        #[arg(long)]
        auth: Option<String>,
        /// Add the server disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// Remove a server.
    Remove {
        /// Server name.
        name: String,
    },
    /// List configured servers.
    List,
    /// Show one server as JSON.
    Get {
        /// Server name.
        name: String,
    },
    /// Enable a server.
    Enable {
        /// Server name.
        name: String,
    },
    /// Disable a server.
    Disable {
        /// Server name.
        name: String,
    },
    /// Report configuration file health.
    Status,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?;
    let outcome = runtime.block_on(run(args));
    // Stdin is read on a blocking thread that cannot be interrupted.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}

async fn run(args: Cli) -> Result<()> {
    let config_path = args.config.unwrap_or_else(|| {
        GlobalConfig::default()
            .persistence_dir
            .join("config.toml")
    });
    let config = GlobalConfig::load_from_path(&config_path)?;
    debug!(path = %config_path.display(), "configuration loaded");

    match args.command {
        Command::Acp(acp) => run_acp(&config, acp).await,
        Command::Mcp(cmd) => run_mcp(&McpConfigStore::new(config.mcp_config_path()), cmd),
    }
}

async fn run_acp(config: &GlobalConfig, args: AcpArgs) -> Result<()> {
    let mut runtime = config.runtime.clone();
    if let Some(command) = args.runtime_command {
        runtime.command = command;
    }
    if !args.runtime_args.is_empty() {
        runtime.args = args.runtime_args;
    }

    let cache_dir = config.cache_dir();
    std::fs::create_dir_all(&cache_dir)
        .map_err(|err| AppError::Io(format!("cannot create {}: {err}", cache_dir.display())))?;

    let spawn = SpawnConfig {
        command: runtime.command,
        args: runtime.args,
        cache_dir,
        startup_timeout: config.startup_timeout(),
    };
    let RuntimeConnection {
        mut child,
        stdin,
        stdout,
    } = spawn_runtime(&spawn).await?;
    info!(command = spawn.command.as_str(), "agent runtime started");

    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_ct.cancel();
    });

    let outcome = serve(
        tokio::io::stdin(),
        tokio::io::stdout(),
        stdout,
        stdin,
        config,
        ct.clone(),
    )
    .await;
    ct.cancel();

    match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
        Ok(Ok(status)) => info!(%status, "agent runtime exited"),
        Ok(Err(err)) => warn!(%err, "failed to reap agent runtime"),
        Err(_elapsed) => {
            warn!("agent runtime still running, killing");
            if let Err(err) = child.kill().await {
                warn!(%err, "failed to kill agent runtime");
            }
        }
    }

    outcome
}

fn run_mcp(store: &McpConfigStore, cmd: McpCommand) -> Result<()> {
    match cmd {
        McpCommand::Add {
            name,
            transport,
            target,
            args,
            env_vars,
            headers,
            auth,
            disabled,
        } => {
            let mut spec = ServerSpec::new(name.as_str(), transport, target);
            spec.args = args;
            spec.env_vars = env_vars;
            spec.headers = headers;
            spec.auth = auth;
            spec.enabled = !disabled;
            store.add_server(spec)?;
            println!("Added MCP server '{name}'");
        }
        McpCommand::Remove { name } => {
            store.remove_server(&name)?;
            println!("Removed MCP server '{name}'");
        }
        McpCommand::List => {
            let servers = store.list_servers()?;
            if servers.is_empty() {
                println!("No MCP servers configured");
            }
            for (name, server) in &servers {
                println!("{}", describe(name, server));
            }
        }
        McpCommand::Get { name } => {
            let server = store.get_server(&name)?;
            println!("{}", serde_json::to_string_pretty(&server)?);
        }
        McpCommand::Enable { name } => {
            store.enable_server(&name)?;
            println!("Enabled MCP server '{name}'");
        }
        McpCommand::Disable { name } => {
            store.disable_server(&name)?;
            println!("Disabled MCP server '{name}'");
        }
        McpCommand::Status => {
            let status = store.config_status();
            println!("{}", status.message);
            for (name, server) in &status.servers {
                println!("  {}", describe(name, server));
            }
        }
    }
    Ok(())
}

fn describe(name: &str, server: &McpServer) -> String {
    let state = if server.enabled() { "enabled" } else { "disabled" };
    format!("{name}\t{}\t{}\t{state}", server.transport(), server.target())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
