//! Domain model module declarations.

pub mod content;
pub mod event;
pub mod plan;
pub mod tool_call;
pub mod usage;
