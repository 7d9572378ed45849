//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionError, CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent
///
/// No conversation state survives between calls and no call is retried;
/// whether to try again is up to whoever triggered the request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CompletionError>;
}
