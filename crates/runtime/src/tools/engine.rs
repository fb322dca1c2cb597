//! Turning untrusted call text into a tool invocation.
//!
//! Validation happens in a fixed order: parse and shape-check the text,
//! resolve the callee against the registry, then decode every argument as
//! a literal. The tool body runs only after all three succeed.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::{Arguments, Registry, Tool};
use crate::{Error, Result};

/// A validated call, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedCall<'r> {
    tool: &'r Tool,
    arguments: Arguments,
}

impl<'r> PreparedCall<'r> {
    pub fn tool(&self) -> &'r Tool {
        self.tool
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Run the tool body, wrapping its failure as [`Error::ToolExecution`].
    pub fn execute(&self) -> Result<Value> {
        debug!(tool = self.tool.name(), "Executing tool");
        self.tool
            .call(&self.arguments)
            .map_err(|source| Error::ToolExecution {
                tool: self.tool.name().to_string(),
                source,
            })
    }
}

/// Validate `call_text` against `registry` without running anything.
pub fn prepare<'r>(registry: &'r Registry, call_text: &str) -> Result<PreparedCall<'r>> {
    let call = expr::parse_call(call_text)?;
    let tool = registry.resolve(call.name())?;

    let positional = call
        .args()
        .iter()
        .map(expr::literal_value)
        .collect::<expr::Result<Vec<_>>>()?;
    let keyword = call
        .kwargs()
        .iter()
        .map(|(name, value)| expr::literal_value(value).map(|v| (name.clone(), v)))
        .collect::<expr::Result<IndexMap<_, _>>>()?;

    Ok(PreparedCall {
        tool,
        arguments: Arguments::new(positional, keyword),
    })
}

/// Validate and run `call_text`, returning the tool's result.
pub fn invoke(registry: &Registry, call_text: &str) -> Result<Value> {
    prepare(registry, call_text)?.execute()
}
