//! Expression error types.

use thiserror::Error;

/// Errors raised while validating or evaluating a call expression.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The input is not a parseable expression.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// The input parsed, but is not a single call to a bare name.
    #[error("invalid call shape: {0}")]
    Shape(String),

    /// An argument is not a supported literal form.
    #[error("unsupported literal: {0}")]
    Literal(String),
}

impl Error {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
