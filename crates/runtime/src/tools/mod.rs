//! Tool declaration, registration and safe invocation.

mod arguments;
mod dispatch;
mod engine;
mod registry;

pub use arguments::{ArgumentError, Arguments};
pub use dispatch::{DispatchEntry, DispatchTable, StructuredToolFn};
pub use engine::{PreparedCall, invoke, prepare};
pub use registry::{Registry, Tool, ToolFn};

/// The error a tool callable reports when its own code fails.
pub type ToolFailure = Box<dyn std::error::Error + Send + Sync>;
