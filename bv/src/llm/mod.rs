//! LLM Client module
//!
//! Provides single-shot completion requests against the completion gateway
//! and the instruction-then-context helper the pipeline stages use.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::CompletionError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};

use crate::config::LlmConfig;

/// Role used for the system message when the caller has no preference
pub const DEFAULT_ROLE: &str = "expert analyst";

/// Default response budget for [`complete_with_context`]
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Create the LLM client from configuration
pub fn create_client(config: &LlmConfig, api_key: &str) -> Result<Arc<dyn LlmClient>, CompletionError> {
    debug!(model = %config.model, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config, api_key)?))
}

/// System message for a role description
pub fn system_prompt_for(role: &str) -> String {
    format!(
        "You are acting as: {}. Base every statement on the material supplied in the user message.",
        role.trim()
    )
}

/// User message: instruction first, then the subject text
///
/// The order matters: text appended after the instruction is treated as
/// material to analyze, not as further instructions.
pub fn user_message(instruction: &str, context_text: &str) -> String {
    format!("{}\n\n{}", instruction, context_text)
}

/// Run one completion over `context_text` with `instruction`
///
/// Builds a two-message exchange (system role, user message) and returns the
/// generated text.
pub async fn complete_with_context(
    llm: &Arc<dyn LlmClient>,
    context_text: &str,
    instruction: &str,
    role: &str,
    max_tokens: u32,
) -> Result<String, CompletionError> {
    debug!(
        context_len = context_text.len(),
        instruction_len = instruction.len(),
        %role,
        "complete_with_context: called"
    );

    let request = CompletionRequest {
        system_prompt: system_prompt_for(role),
        messages: vec![Message::user(user_message(instruction, context_text))],
        max_tokens,
    };

    let response = llm.complete(request).await?;
    debug!(
        content_len = response.content.len(),
        tokens = response.usage.total(),
        "complete_with_context: done"
    );
    Ok(response.content)
}
