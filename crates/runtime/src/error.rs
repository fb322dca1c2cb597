use thiserror::Error;

use crate::model::ModelError;
use crate::tools::ToolFailure;

/// Runtime errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The call text failed validation or literal evaluation.
    #[error(transparent)]
    Expr(#[from] expr::Error),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool's own code failed.
    #[error("tool {tool} failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: ToolFailure,
    },

    #[error("invalid input for tool {tool}: {message}")]
    InvalidToolInput { tool: String, message: String },

    #[error("invalid tool name: {0:?}")]
    InvalidToolName(String),

    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    /// A declared input schema is not a valid JSON Schema.
    #[error("invalid input schema for tool {tool}: {message}")]
    InvalidToolSchema { tool: String, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Coarse classification of [`Error`], for callers that recover locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Shape,
    Literal,
    UnknownTool,
    ToolExecution,
    InvalidToolInput,
    Registration,
    InvalidRequest,
    MalformedResponse,
    Model,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Expr(expr::Error::Syntax { .. }) => ErrorKind::Syntax,
            Self::Expr(expr::Error::Shape(_)) => ErrorKind::Shape,
            Self::Expr(_) => ErrorKind::Literal,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::ToolExecution { .. } => ErrorKind::ToolExecution,
            Self::InvalidToolInput { .. } => ErrorKind::InvalidToolInput,
            Self::InvalidToolName(_) | Self::DuplicateTool(_) | Self::InvalidToolSchema { .. } => {
                ErrorKind::Registration
            }
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Model(_) => ErrorKind::Model,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
