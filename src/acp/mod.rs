//! Agent Client Protocol (ACP) stream handling.
//!
//! The bridge sits between two NDJSON streams: the ACP client on its own
//! stdio and the agent runtime on a child process's stdio.
//!
//! - `codec`: [`LinesCodec`](tokio_util::codec::LinesCodec)-based framing.
//! - `notification`: outbound `session/update` payload types.
//! - `rpc`: JSON-RPC parsing and response builders for the client side.
//! - `reader`: read tasks for the client and runtime streams.
//! - `writer`: write task shared by both outbound streams.
//! - `spawner`: runtime process spawning.

pub mod codec;
pub mod notification;
pub mod reader;
pub mod rpc;
pub mod spawner;
pub mod writer;
