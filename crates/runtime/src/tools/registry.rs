//! Ordered tool registry for the text protocol.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Arguments, ToolFailure};
use crate::{Error, Result};

/// A callable tool body.
pub type ToolFn = dyn Fn(&Arguments) -> std::result::Result<Value, ToolFailure> + Send + Sync;

/// A named, documented callable the model may select.
#[derive(Clone)]
pub struct Tool {
    name: String,
    documentation: String,
    callable: Arc<ToolFn>,
}

impl Tool {
    /// Create a tool. The name must be a bare identifier other than the
    /// callee of [`NO_TOOL_SENTINEL`](crate::NO_TOOL_SENTINEL).
    pub fn new<F>(
        name: impl Into<String>,
        documentation: impl Into<String>,
        callable: F,
    ) -> Result<Self>
    where
        F: Fn(&Arguments) -> std::result::Result<Value, ToolFailure> + Send + Sync + 'static,
    {
        let name = name.into();
        let reserved = crate::NO_TOOL_SENTINEL.strip_suffix("()") == Some(name.as_str());
        if reserved || !expr::is_identifier(&name) {
            return Err(Error::InvalidToolName(name));
        }
        Ok(Self {
            name,
            documentation: documentation.into(),
            callable: Arc::new(callable),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// Run the tool body. Failures are returned as raised.
    pub fn call(&self, args: &Arguments) -> std::result::Result<Value, ToolFailure> {
        (self.callable)(args)
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("documentation", &self.documentation)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of tools with unique names.
///
/// Names are checked for uniqueness when tools are added, so resolution by
/// first match is unambiguous.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: Vec<Tool>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, failing on the first duplicate name.
    pub fn from_tools(tools: impl IntoIterator<Item = Tool>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Append a tool.
    pub fn register(&mut self, tool: Tool) -> Result<()> {
        if self.tools.iter().any(|t| t.name == tool.name) {
            return Err(Error::DuplicateTool(tool.name));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Replace the whole sequence. On error the registry is left unchanged.
    pub fn replace(&mut self, tools: impl IntoIterator<Item = Tool>) -> Result<()> {
        *self = Self::from_tools(tools)?;
        Ok(())
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Find the first tool named `name`.
    pub fn resolve(&self, name: &str) -> Result<&Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// One block per tool, in registry order, for use in prompts.
    pub fn render_docs(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("Function \"{}\":\n{}", tool.name, tool.documentation))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
