//! OpenAI-compatible chat-completions client
//!
//! Talks to any gateway exposing `POST {base_url}/chat/completions` with
//! bearer auth (OpenRouter by default). Single attempt per call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{CompletionError, CompletionRequest, CompletionResponse, LlmClient, TokenUsage};
use crate::config::LlmConfig;

/// Longest gateway error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// OpenAI-compatible gateway client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from configuration and the resolved API key
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let timeout = config.timeout();

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model.clone(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.min(self.max_tokens),
        })
    }

    /// Parse the gateway response, requiring a non-empty first choice
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<CompletionResponse, CompletionError> {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("No choices in response".to_string()))?;

        let content = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CompletionError::MalformedResponse("Empty message content".to_string()))?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens.unwrap_or(0),
                output_tokens: u.completion_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    debug!("complete: timed out");
                    CompletionError::Timeout(self.timeout)
                } else {
                    debug!(error = %e, "complete: network error");
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
                message.truncate(cut);
            }
            return Err(CompletionError::HttpStatus { status, message });
        }

        // The body read is bounded by the same client timeout
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(self.timeout)
            } else {
                CompletionError::Transport(e.to_string())
            }
        })?;

        let api_response: OpenAIResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        debug!("complete: success");
        self.parse_response(api_response)
    }
}

// Chat-completions response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}
