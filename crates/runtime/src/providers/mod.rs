//! Model provider adapters.
//!
//! Each provider implements the client traits in [`crate::model`] for its
//! specific API.

mod anthropic;

pub use anthropic::{
    AnthropicAuth, AnthropicBackend, AnthropicBackendBuilder, DEFAULT_ANTHROPIC_VERSION,
    DEFAULT_BASE_URL,
};
