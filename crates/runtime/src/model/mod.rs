//! Model protocol types and client traits.

pub mod client;
pub mod errors;
pub mod types;

pub use client::{Converse, InvokeModel};
pub use errors::ModelError;
pub use types::{
    ContentBlock, ConverseRequest, ConverseResponse, InvokeRequest, Message, Role, StopReason,
    ToolResult, ToolResultContent, ToolResultStatus, ToolSpec, ToolUse, Usage,
};
