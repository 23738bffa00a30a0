//! Language-model backends.
//!
//! The assistant talks to a [`ChatBackend`]; the production backend is a
//! local Ollama server reached over its `/api/chat` endpoint.

use crate::assistant::reply::AssistantError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A model that completes one system + user prompt pair.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the prompt and return the raw text of the model's answer.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AssistantError>;

    /// Name of the model, for logging and reports.
    fn model_name(&self) -> &str;
}

/// Configuration for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.0,
            timeout_seconds: 120,
        }
    }
}

/// Message in an Ollama chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Constrains the model to emit a JSON document.
    format: String,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Backend that calls a local Ollama server.
pub struct OllamaBackend {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> anyhow::Result<Self> {
        info!(
            "Initializing Ollama backend with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AssistantError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: "json".to_string(),
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending chat request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let failure = if e.is_timeout() {
                    SendFailure::Timeout
                } else if e.is_connect() {
                    SendFailure::Connect
                } else {
                    SendFailure::Other(e.to_string())
                };
                let error = failure.into_error(&self.config);
                warn!("Ollama request failed: {:?}", error);
                error
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama API error {}: {}", status, body);
            return Err(classify_api_error(status.as_u16(), &body));
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Ollama response: {}", e);
            AssistantError::Unavailable(e.to_string())
        })?;

        Ok(chat_response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Why a request never got an HTTP response.
#[derive(Debug)]
enum SendFailure {
    Timeout,
    Connect,
    Other(String),
}

impl SendFailure {
    fn into_error(self, config: &OllamaConfig) -> AssistantError {
        let detail = match self {
            SendFailure::Timeout => {
                format!("Request timed out after {}s", config.timeout_seconds)
            }
            SendFailure::Connect => format!("Cannot connect to Ollama at {}", config.ollama_url),
            SendFailure::Other(e) => format!("Failed to send request: {}", e),
        };
        AssistantError::Unavailable(detail)
    }
}

/// Map a non-success HTTP status to the error shown to the user.
fn classify_api_error(status: u16, body: &str) -> AssistantError {
    if status == 401 || status == 403 || body.contains("API key not valid") {
        AssistantError::NotConfigured
    } else {
        AssistantError::Unavailable(format!("HTTP {}: {}", status, body))
    }
}
