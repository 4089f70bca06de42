//! Provider client module for the chat-completions AI endpoints.
//!
//! This module provides a trait-based abstraction over one provider
//! endpoint, an Ark (OpenAI-compatible) implementation, and the
//! primary/backup failover router shared by all tasks.
//!
//! Supports multimodal content (text + images) for vision-capable models.

mod client;
mod error;
mod router;

pub use client::ArkClient;
pub use error::{classify_http_status, ProviderError, ProviderErrorKind};
pub use router::{ProviderRouter, RouterError, RouterSnapshot, FAILOVER_THRESHOLD};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Content part for multimodal messages (text or image).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text { text: String },
    /// Image URL content (for vision models)
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

/// Image URL wrapper for vision content. The url may be an https link or a
/// `data:image/...;base64,` URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    /// Create a text content part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create an image URL content part.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// A message in a chat conversation. Content is always the multimodal part
/// array; the provider accepts it for plain text as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    /// Create a user message with text content.
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: vec![ContentPart::text(text)],
        }
    }

    /// Create a user message with text and a single image.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: vec![ContentPart::text(text), ContentPart::image_url(image_url)],
        }
    }
}

/// Style hint for text optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Professional,
    Literary,
    Storytelling,
    Warm,
}

impl TextStyle {
    /// Instruction prefix for the optimization prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            TextStyle::Professional => "请将以下文本优化为专业、正式的表达方式",
            TextStyle::Literary => "请将以下文本优化为文学性、富有感情色彩的表达方式",
            TextStyle::Storytelling => "请将以下文本优化为生动、引人入胜的故事叙述方式",
            TextStyle::Warm => "请将以下文本优化为温馨、亲切的表达方式",
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle::Warm
    }
}

impl std::str::FromStr for TextStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "professional" => Ok(TextStyle::Professional),
            "literary" => Ok(TextStyle::Literary),
            "storytelling" => Ok(TextStyle::Storytelling),
            "warm" | "" => Ok(TextStyle::Warm),
            other => Err(format!("unknown style: {}", other)),
        }
    }
}

/// Trait for a single provider endpoint.
///
/// One implementation exists per configured endpoint (primary, backup);
/// the router owns both and is the only caller in production code. Tests
/// substitute stub implementations.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Name used in logs and composite failover errors.
    fn name(&self) -> &str;

    /// Model ids as "vision/text", for operator status responses.
    fn model_ids(&self) -> String;

    /// Describe an image. `image_url` may be an https link or a data URI.
    async fn analyze_image(&self, image_url: &str, prompt: &str) -> Result<String, ProviderError>;

    /// Generate text from a prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Rewrite text in the given style, preserving meaning.
    async fn optimize_text(&self, text: &str, style: TextStyle) -> Result<String, ProviderError>;
}
