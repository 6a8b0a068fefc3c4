#![forbid(unsafe_code)]

//! Bridges a coding agent's internal event stream to Agent Client Protocol
//! (ACP) session updates consumed by IDE clients.

pub mod acp;
pub mod config;
pub mod driver;
pub mod emitter;
pub mod errors;
pub mod mcp_config;
pub mod models;
pub mod orchestrator;
pub mod resources;
pub mod translator;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
