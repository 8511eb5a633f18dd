use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::configuration::types::LlmSection;
use crate::error_handling::types::GenerationError;
use crate::generation::history::ChatMessage;

/// The text-generation collaborator contract.
///
/// Implementations may be slow or remote; callers own the fallback story.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    /// Builds the client from the `[llm]` configuration section. A missing
    /// API key is not fatal here: every call will fail over to the
    /// deterministic fallback instead.
    pub fn new(section: &LlmSection) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&section.api_key_env).ok();
        if api_key.is_none() {
            log::warn!(
                "{} is not set; generated replies will fall back to fixed acknowledgements",
                section.api_key_env
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(GenerationError::from)?;

        Ok(Self {
            client,
            base_url: section.base_url.trim_end_matches('/').to_string(),
            model: section.model_name.clone(),
            api_key,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl ResponseGenerator for OpenAiGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GenerationError::Authentication(String::from("API key not set")))?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(self.chat_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(GenerationError::Authentication(format!("HTTP {}", status)));
            }
            return Err(GenerationError::Internal(format!("HTTP {}", status)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse(String::from("no choices")))?;

        Ok(choice.message.content)
    }
}
