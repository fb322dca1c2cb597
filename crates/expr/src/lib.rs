//! Restricted call-expression parsing for model-generated tool calls.
//!
//! Model output such as `add(6, b=12)` is untrusted text. This crate turns
//! it into a [`CallExpr`] only when it is exactly one call to a bare name,
//! and decodes its arguments only when they are literals. Nothing here
//! evaluates names, operators or calls.
//!
//! # Example
//!
//! ```
//! use expr::{literal_value, parse_call};
//!
//! let call = parse_call("add(6, b=12)")?;
//! assert_eq!(call.name(), "add");
//! assert_eq!(literal_value(&call.args()[0])?, serde_json::json!(6));
//! assert_eq!(literal_value(&call.kwargs()["b"])?, serde_json::json!(12));
//!
//! assert!(matches!(parse_call("os.system('ls')"), Err(expr::Error::Shape(_))));
//! # Ok::<(), expr::Error>(())
//! ```

mod ast;
mod error;
mod lexer;
mod literal;
mod parser;

pub use ast::{Argument, Call, CallExpr, ComprehensionKind, Constant, Expr};
pub use error::{Error, Result};
pub use literal::literal_value;
pub use parser::{is_identifier, parse_call, parse_expression};
