//! Decoded call arguments handed to tool callables.

use indexmap::IndexMap;
use serde_json::{Number, Value};
use thiserror::Error;

/// Argument binding failures raised from inside a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("argument '{0}' given by position and by keyword")]
    Duplicate(String),

    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    #[error("takes {expected} positional arguments but {given} were given")]
    TooMany { expected: usize, given: usize },

    #[error("argument '{name}' must be {expected}")]
    WrongType { name: String, expected: &'static str },
}

/// Positional and keyword argument values of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new(positional: Vec<Value>, keyword: IndexMap<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    /// The value for parameter `name` at position `index`, by position first
    /// and then by keyword.
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keyword.get(name))
    }

    /// Bind every argument to `params`, rejecting extra, repeated or
    /// missing arguments.
    pub fn bind(&self, params: &[&str]) -> Result<Vec<&Value>, ArgumentError> {
        if self.positional.len() > params.len() {
            return Err(ArgumentError::TooMany {
                expected: params.len(),
                given: self.positional.len(),
            });
        }

        if let Some(name) = self.keyword.keys().find(|k| !params.contains(&k.as_str())) {
            return Err(ArgumentError::UnexpectedKeyword(name.clone()));
        }

        params
            .iter()
            .enumerate()
            .map(|(index, name)| {
                match (self.positional.get(index), self.keyword.get(*name)) {
                    (Some(_), Some(_)) => Err(ArgumentError::Duplicate(name.to_string())),
                    (Some(value), None) | (None, Some(value)) => Ok(value),
                    (None, None) => Err(ArgumentError::Missing(name.to_string())),
                }
            })
            .collect()
    }

    /// The numeric value of parameter `name` at position `index`.
    pub fn number(&self, index: usize, name: &str) -> Result<&Number, ArgumentError> {
        match self.get(index, name) {
            Some(Value::Number(n)) => Ok(n),
            Some(_) => Err(wrong_type(name, "a number")),
            None => Err(ArgumentError::Missing(name.to_string())),
        }
    }

    /// The string value of parameter `name` at position `index`.
    pub fn string(&self, index: usize, name: &str) -> Result<&str, ArgumentError> {
        match self.get(index, name) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(wrong_type(name, "a string")),
            None => Err(ArgumentError::Missing(name.to_string())),
        }
    }
}

fn wrong_type(name: &str, expected: &'static str) -> ArgumentError {
    ArgumentError::WrongType {
        name: name.to_string(),
        expected,
    }
}
