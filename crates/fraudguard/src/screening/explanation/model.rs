//! External explanation model boundary: one attempt per cache miss, typed
//! failures, no internal retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Anthropic Messages API endpoint.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Required API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model used for risk explanations.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Explanations are short; cap the completion budget accordingly.
const MAX_TOKENS: u32 = 512;

/// Connection settings for the explanation model.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Failure modes of a single explanation attempt.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("explanation request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("model API returned status {0}")]
    Api(u16),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Consumed interface of the external language model.
#[async_trait]
pub trait ExplanationModel: Send + Sync {
    async fn explain(&self, prompt: &str) -> Result<String, ModelError>;
}

#[async_trait]
impl<M: ExplanationModel> ExplanationModel for std::sync::Arc<M> {
    async fn explain(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).explain(prompt).await
    }
}

/// Explanation model backed by the Anthropic Messages API.
pub struct AnthropicExplainer {
    http: reqwest::Client,
    config: LlmConfig,
}

impl AnthropicExplainer {
    pub fn new(config: LlmConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ModelError::Transport(err.to_string()))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ExplanationModel for AnthropicExplainer {
    async fn explain(&self, prompt: &str) -> Result<String, ModelError> {
        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ModelError::Api(response.status().as_u16()));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|err| ModelError::MalformedResponse(err.to_string()))?;

        extract_text(body)
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

fn extract_text(response: MessagesResponse) -> Result<String, ModelError> {
    let text = response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(ModelError::MalformedResponse(
            "response contained no text content".to_string(),
        ));
    }
    Ok(text)
}
