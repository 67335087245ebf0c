//! Chat completion client for the language-model API.
//!
//! [`CompletionClient`] is the seam the relay calls through; [`OpenAiClient`]
//! implements it against the OpenAI chat completions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::CompletionConfig;
use crate::error::{ApiError, Result};

/// Generates a reply for a single conversation turn.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the generated reply text for `conversation_text`.
    async fn generate_reply(&self, conversation_text: &str) -> Result<String>;
}

/// OpenAI chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiClient {
    /// Creates a client; the request timeout comes from `config`.
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request(&self, conversation_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(&self.config.system_prompt),
                ChatMessage::user(conversation_text),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Malformed(format!("failed to parse response: {}", e)))?;

        debug!(
            model = %self.config.model,
            tokens = parsed.usage.as_ref().map_or(0, |u| u.total_tokens),
            "Completion received"
        );

        parsed.into_text()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn generate_reply(&self, conversation_text: &str) -> Result<String> {
        let request = self.build_request(conversation_text);
        trace!("Sending chat request: {:?}", request);

        match self.send_once(&request).await {
            Err(e) if self.config.retry_on_network && e.is_transient_network() => {
                warn!(error = %e, "Completion request failed, retrying once");
                self.send_once(&request).await
            }
            result => result,
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A message in the chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Extracts the trimmed text of the first choice.
    pub fn into_text(self) -> Result<String> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ApiError::Malformed("no content in response".to_string()));
        }
        Ok(text)
    }
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
