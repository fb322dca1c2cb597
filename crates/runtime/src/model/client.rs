//! Model client contracts.

use std::future::Future;

use super::errors::ModelError;
use super::types::{ConverseRequest, ConverseResponse, InvokeRequest};

/// A client that sends a serialized request body to a model and returns the
/// raw response body.
///
/// Retries, timeouts and authentication belong to the implementation.
pub trait InvokeModel: Send + Sync {
    fn invoke_model(
        &self,
        request: InvokeRequest<'_>,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

/// A client for provider-native structured tool use.
pub trait Converse: Send + Sync {
    fn converse(
        &self,
        request: ConverseRequest<'_>,
    ) -> impl Future<Output = Result<ConverseResponse, ModelError>> + Send;
}
