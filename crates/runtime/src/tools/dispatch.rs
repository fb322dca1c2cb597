//! Name-keyed dispatch for provider-native tool use.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use jsonschema::JSONSchema;
use serde_json::Value;

use super::ToolFailure;
use crate::model::ToolSpec;
use crate::{Error, Result};

/// A structured tool body: typed JSON input in, JSON output out.
pub type StructuredToolFn = dyn Fn(&Value) -> std::result::Result<Value, ToolFailure> + Send + Sync;

/// A declared tool paired with its implementation.
#[derive(Clone)]
pub struct DispatchEntry {
    spec: ToolSpec,
    schema: Arc<JSONSchema>,
    handler: Arc<StructuredToolFn>,
}

impl DispatchEntry {
    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Validate the input against the declared schema, then run the handler.
    pub fn call(&self, input: &Value) -> Result<Value> {
        let tool = &self.spec.name;
        if let Err(errors) = self.schema.validate(input) {
            let message = errors
                .map(|error| error.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::InvalidToolInput {
                tool: tool.clone(),
                message,
            });
        }

        (self.handler)(input).map_err(|source| Error::ToolExecution {
            tool: tool.clone(),
            source,
        })
    }
}

impl fmt::Debug for DispatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEntry")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Declared tools keyed by name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    entries: IndexMap<String, DispatchEntry>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a tool. Names must be unique and the input schema must
    /// compile.
    pub fn register<F>(&mut self, spec: ToolSpec, handler: F) -> Result<()>
    where
        F: Fn(&Value) -> std::result::Result<Value, ToolFailure> + Send + Sync + 'static,
    {
        if self.entries.contains_key(&spec.name) {
            return Err(Error::DuplicateTool(spec.name));
        }
        let schema =
            JSONSchema::compile(&spec.input_schema).map_err(|error| Error::InvalidToolSchema {
                tool: spec.name.clone(),
                message: error.to_string(),
            })?;
        self.entries.insert(
            spec.name.clone(),
            DispatchEntry {
                spec,
                schema: Arc::new(schema),
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, spec: ToolSpec, handler: F) -> Result<Self>
    where
        F: Fn(&Value) -> std::result::Result<Value, ToolFailure> + Send + Sync + 'static,
    {
        self.register(spec, handler)?;
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Result<&DispatchEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))
    }

    /// Resolve `name` and run it on `input`.
    pub fn call(&self, name: &str, input: &Value) -> Result<Value> {
        self.resolve(name)?.call(input)
    }

    /// Tool declarations to send with each model request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries.values().map(|entry| entry.spec.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn calc_spec() -> ToolSpec {
        ToolSpec {
            name: "calc".into(),
            description: "Add two numbers.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"]
            }),
        }
    }

    fn table() -> DispatchTable {
        DispatchTable::new()
            .with(calc_spec(), |input: &Value| {
                let a = input["a"].as_f64().ok_or("a must be a number")?;
                let b = input["b"].as_f64().ok_or("b must be a number")?;
                Ok(json!({"operation": a + b}))
            })
            .unwrap()
    }

    #[test]
    fn call_dispatches_by_name() {
        let output = table().call("calc", &json!({"a": 3, "b": 2})).unwrap();
        assert_eq!(output, json!({"operation": 5.0}));
    }

    #[test]
    fn unknown_name_fails() {
        let err = table().call("multiply", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
    }

    #[test]
    fn missing_required_property_is_rejected_before_dispatch() {
        let err = table().call("calc", &json!({"a": 3})).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidToolInput { ref message, .. } if message.contains("required")
        ));
        let err = table().call("calc", &json!([3, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidToolInput);
    }

    #[test]
    fn mistyped_input_never_reaches_the_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let table = DispatchTable::new()
            .with(calc_spec(), move |_: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(0))
            })
            .unwrap();

        for input in [
            json!({"a": "rm -rf", "b": [1]}),
            json!({"a": 1, "b": "2"}),
            json!({"a": null, "b": 2}),
        ] {
            let err = table.call("calc", &input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidToolInput, "{input}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        table.call("calc", &json!({"a": 1, "b": 2.5})).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_schema_is_rejected_at_registration() {
        let spec = ToolSpec {
            name: "broken".into(),
            description: "Schema with a bad type.".into(),
            input_schema: json!({"type": 5}),
        };
        let err = DispatchTable::new()
            .with(spec, |_: &Value| Ok(Value::Null))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidToolSchema { ref tool, .. } if tool == "broken"));
        assert_eq!(err.kind(), ErrorKind::Registration);
    }

    #[test]
    fn handler_failure_is_wrapped() {
        let spec = ToolSpec {
            name: "flaky".into(),
            description: "Always fails.".into(),
            input_schema: json!({"type": "object"}),
        };
        let table = DispatchTable::new()
            .with(spec, |_: &Value| Err("disk full".into()))
            .unwrap();
        let err = table.call("flaky", &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolExecution);
        assert_eq!(err.to_string(), "tool flaky failed: disk full");
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let err = table()
            .with(calc_spec(), |_: &Value| Ok(Value::Null))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registration);
    }

    #[test]
    fn specs_keep_declaration_order() {
        let spec = ToolSpec {
            name: "echo".into(),
            description: "Echo input.".into(),
            input_schema: json!({"type": "object"}),
        };
        let table = table().with(spec, |input: &Value| Ok(input.clone())).unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), ["calc", "echo"]);
        assert_eq!(table.specs()[1].name, "echo");
    }
}
