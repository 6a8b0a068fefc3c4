//! Bridge orchestration.
//!
//! Wires the four NDJSON tasks (client reader/writer, runtime
//! reader/writer) to the [`bridge::Bridge`] dispatcher and the per-session
//! runners.

pub mod bridge;
pub mod registry;
pub mod session_runner;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::acp::reader::{run_client_reader, run_runtime_reader};
use crate::acp::writer::run_writer;
use crate::config::GlobalConfig;
use crate::driver::stdio_runtime::StdioRuntime;
use crate::emitter::ChannelEmitter;
use crate::resources::ResourceMaterializer;
use crate::translator::EventTranslator;
use crate::Result;

use self::bridge::Bridge;
use self::registry::SessionRegistry;

/// Depth of the reader → dispatcher and dispatcher → writer channels.
const STREAM_BUFFER: usize = 256;

/// Serve one client against one runtime until either side goes away or
/// `cancel` fires.
///
/// `client_in`/`client_out` carry the ACP JSON-RPC stream;
/// `runtime_out` is the runtime's stdout and `runtime_in` its stdin.
///
/// # Errors
///
/// Returns the dispatcher's error if the client stream closes mid-reply.
pub async fn serve<CI, CO, RO, RI>(
    client_in: CI,
    client_out: CO,
    runtime_out: RO,
    runtime_in: RI,
    config: &GlobalConfig,
    cancel: CancellationToken,
) -> Result<()>
where
    CI: AsyncRead + Unpin + Send + 'static,
    CO: AsyncWrite + Unpin + Send + 'static,
    RO: AsyncRead + Unpin + Send + 'static,
    RI: AsyncWrite + Unpin + Send + 'static,
{
    let io_cancel = cancel.child_token();

    let (client_msg_tx, client_msg_rx) = mpsc::channel(STREAM_BUFFER);
    let (runtime_msg_tx, runtime_msg_rx) = mpsc::channel(STREAM_BUFFER);
    let (client_out_tx, client_out_rx) = mpsc::channel(STREAM_BUFFER);
    let (runtime_in_tx, runtime_in_rx) = mpsc::channel(STREAM_BUFFER);

    let client_reader = tokio::spawn(run_client_reader(client_in, client_msg_tx, io_cancel.clone()));
    let runtime_reader = tokio::spawn(run_runtime_reader(
        runtime_out,
        runtime_msg_tx,
        io_cancel.clone(),
    ));
    let client_writer = tokio::spawn(run_writer("client", client_out, client_out_rx, io_cancel.clone()));
    let runtime_writer = tokio::spawn(run_writer(
        "runtime",
        runtime_in,
        runtime_in_rx,
        io_cancel.clone(),
    ));

    let registry = SessionRegistry::new(
        EventTranslator::new(config.bridge.emit_metrics),
        Arc::new(ChannelEmitter::new(client_out_tx.clone())),
        config.bridge.event_buffer,
        cancel.child_token(),
    );
    let bridge = Bridge::new(
        Arc::new(StdioRuntime::new(runtime_in_tx)),
        ResourceMaterializer::new(config.cache_dir()),
        registry,
        client_out_tx,
    );

    info!(cache_dir = %config.cache_dir().display(), "bridge ready");
    let outcome = bridge.run(client_msg_rx, runtime_msg_rx, cancel).await;

    // All senders are gone once the bridge is dropped; writers drain and exit.
    for (name, writer) in [("client", client_writer), ("runtime", runtime_writer)] {
        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(stream = name, %err, "writer stopped with error"),
            Err(err) => warn!(stream = name, %err, "writer task failed"),
        }
    }

    io_cancel.cancel();
    let _ = tokio::join!(client_reader, runtime_reader);
    info!("bridge stopped");
    outcome
}
