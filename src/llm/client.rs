use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BackendError;

const SERVICE: &str = "Anthropic API";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// API root, overridable for proxies and tests
    pub base_url: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-20250514";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";

    /// Create config from environment variables
    ///
    /// ANTHROPIC_API_KEY is required; ANTHROPIC_MODEL and ANTHROPIC_BASE_URL
    /// override the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Create with default settings
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build Anthropic HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a message and return the text of the first text block
    ///
    /// A success status with a body we cannot read as a Messages response is
    /// reported as `InvalidResponse` with the body attached, so callers can
    /// still audit what came back.
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String, BackendError> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, chars = user.len(), "Sending analysis request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(SERVICE, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::from_reqwest(SERVICE, &e))?;

        if !status.is_success() {
            return Err(BackendError::from_status(SERVICE, status, body));
        }

        let parsed: AnthropicResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => return Err(BackendError::invalid_response(SERVICE, e, body)),
        };

        // Extract text from the first text block
        let text = parsed
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text);

        match text {
            Some(text) => Ok(text),
            None => Err(BackendError::invalid_response(
                SERVICE,
                "no text content in response",
                body,
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
