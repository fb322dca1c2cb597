use serde_json::Value;
use thiserror::Error;

/// Errors from model client calls.
///
/// These are transport and provider failures. The orchestrators pass them
/// through unchanged.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider returned an error response.
    #[error("provider api ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request could not be encoded for the provider.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Build an API error, preferring the message from the provider's error
    /// payload over the raw body.
    pub fn api(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|payload| {
                let message = payload
                    .pointer("/error/message")
                    .or_else(|| payload.pointer("/Error/Message"))
                    .or_else(|| payload.get("message"))?;
                message.as_str().map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());
        Self::Api { status, message }
    }
}
