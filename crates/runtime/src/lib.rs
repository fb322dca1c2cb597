//! fcall runtime: letting a model call host functions.
//!
//! Two protocols are provided over the same allow-list discipline:
//!
//! - **Text protocol** ([`TextOrchestrator`]): the model writes a call
//!   expression such as `add(6, 12)`. It is parsed by the restricted `expr`
//!   grammar, resolved against a [`Registry`], and only then executed. A
//!   second round feeds the result back to the model.
//! - **Structured protocol** ([`StructuredLoop`]): the model requests tools
//!   through provider-native tool use with JSON input, dispatched through a
//!   [`DispatchTable`].
//!
//! Model access goes through the [`InvokeModel`] and [`Converse`] traits;
//! [`AnthropicBackend`] implements both.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{
//!     AnthropicAuth, AnthropicBackend, Arguments, ChatMessage, ConversationRequest, Registry,
//!     TextOrchestrator, Tool,
//! };
//!
//! # async fn example() -> runtime::Result<()> {
//! let add = Tool::new("add", "Adds a and b.", |args: &Arguments| {
//!     let a = args.number(0, "a")?.as_f64().unwrap_or_default();
//!     let b = args.number(1, "b")?.as_f64().unwrap_or_default();
//!     Ok(serde_json::json!(a + b))
//! })?;
//! let registry = Registry::from_tools([add])?;
//!
//! let backend = AnthropicBackend::builder(AnthropicAuth::ApiKey("sk-ant-...".into())).build();
//! let orchestrator = TextOrchestrator::new(backend, registry);
//!
//! let request = ConversationRequest::new(
//!     1024,
//!     "2023-06-01",
//!     vec![ChatMessage::user("What is 6 plus 12?")],
//! );
//! let result = orchestrator.run("claude-sonnet-4-20250514", &request).await?;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
mod orchestrator;
mod providers;
mod structured;
pub mod tools;

pub use error::{Error, ErrorKind, Result};
pub use model::{
    ContentBlock, Converse, ConverseRequest, ConverseResponse, InvokeModel, InvokeRequest,
    Message, ModelError, Role, StopReason, ToolResult, ToolResultContent, ToolResultStatus,
    ToolSpec, ToolUse, Usage,
};
pub use orchestrator::{
    ChatMessage, ConversationRequest, InvocationResult, NO_TOOL_SENTINEL, OnInvalidCall,
    TextOrchestrator, ToolInfo,
};
pub use providers::{
    AnthropicAuth, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_ANTHROPIC_VERSION,
    DEFAULT_BASE_URL,
};
pub use structured::{StructuredLoop, StructuredOutcome, ToolUseRecord};
pub use tools::{
    ArgumentError, Arguments, DispatchTable, PreparedCall, Registry, Tool, ToolFailure, invoke,
    prepare,
};
