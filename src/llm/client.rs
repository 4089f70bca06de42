//! Ark (OpenAI-compatible) chat-completions client.
//!
//! One `ArkClient` wraps one endpoint configuration. It is stateless: every
//! call builds a request, posts it with a bounded timeout, and extracts
//! `choices[0].message.content` from the response.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;

use super::error::ProviderError;
use super::{ChatMessage, ProviderClient, TextStyle};

/// Client for one chat-completions endpoint.
pub struct ArkClient {
    http: Client,
    config: ProviderConfig,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

impl ArkClient {
    /// Create a client for the given endpoint with a per-call timeout.
    pub fn new(config: ProviderConfig, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            config,
            timeout,
        }
    }

    /// Execute a single chat-completions request.
    async fn execute(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(provider = %self.config.name, model, "Sending chat-completions request");

        let response = match self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return if e.is_timeout() {
                    Err(ProviderError::timeout(format!("Request timeout: {}", e)))
                } else if e.is_connect() {
                    Err(ProviderError::network(format!("Connection failed: {}", e)))
                } else {
                    Err(ProviderError::network(format!("Request failed: {}", e)))
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(provider = %self.config.name, status = status.as_u16(), "Provider returned error");
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::parse(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::parse("No choices in response".to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderClient for ArkClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn model_ids(&self) -> String {
        format!("{}/{}", self.config.vision_model, self.config.text_model)
    }

    async fn analyze_image(&self, image_url: &str, prompt: &str) -> Result<String, ProviderError> {
        let messages = [ChatMessage::user_with_image(prompt, image_url)];
        self.execute(&self.config.vision_model, &messages).await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let messages = [ChatMessage::user(prompt)];
        self.execute(&self.config.text_model, &messages).await
    }

    async fn optimize_text(&self, text: &str, style: TextStyle) -> Result<String, ProviderError> {
        let prompt = format!(
            "{}，保持原意不变，使表达更加优美流畅：\n\n{}",
            style.instruction(),
            text
        );
        let messages = [ChatMessage::user(prompt)];
        self.execute(&self.config.text_model, &messages).await
    }
}
