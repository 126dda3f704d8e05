//! OpenAI-compatible LLM extraction backend.
//!
//! The backend sends an extraction prompt as a chat completion and scans
//! the response for the outermost JSON array. Rate-limit and server
//! errors are retried with exponential backoff plus jitter, bounded by
//! `LLM_MAX_ATTEMPTS`; exhausting the retries yields `Ok(None)` so the
//! pipeline records zero records for the paragraph and moves on.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use polymat_core::{defaults, Error, Result};

/// Default OpenAI API endpoint.
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";

/// Default extraction model.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Backend trait for prompt-based record extraction.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Run the prompt and return the parsed JSON record array, or `None`
    /// when the model produced no parsable array (including after
    /// exhausted retries).
    async fn extract_records(&self, prompt: &str) -> Result<Option<JsonValue>>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model used for extraction.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum attempts per call (1 initial + retries).
    pub max_attempts: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_seconds: defaults::LLM_TIMEOUT_SECS,
            max_attempts: defaults::LLM_MAX_ATTEMPTS,
        }
    }
}

/// OpenAI-compatible extraction backend.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

/// One chat call's failure, classified for the retry loop.
struct CallError {
    retryable: bool,
    message: String,
}

/// Whether an HTTP status is worth retrying.
fn is_retryable(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing LLM extraction backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig {
            base_url: std::env::var(defaults::ENV_LLM_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_LLM_URL.to_string()),
            api_key: std::env::var(defaults::ENV_LLM_API_KEY).ok(),
            ..OpenAiConfig::default()
        };
        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    async fn chat_once(&self, prompt: &str) -> std::result::Result<String, CallError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| CallError {
            retryable: true,
            message: format!("request failed: {}", e),
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError {
                retryable: is_retryable(status),
                message: format!("API returned {}: {}", status, body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| CallError {
            retryable: false,
            message: format!("failed to parse chat response: {}", e),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(CallError {
                retryable: false,
                message: "chat response had no content".to_string(),
            })
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = defaults::LLM_BACKOFF_BASE_MS * 2u64.saturating_pow(attempt - 1);
        let jitter = rand::thread_rng().gen_range(0..=defaults::LLM_BACKOFF_JITTER_MS);
        Duration::from_millis(base + jitter)
    }
}

#[async_trait]
impl ExtractionBackend for OpenAiBackend {
    async fn extract_records(&self, prompt: &str) -> Result<Option<JsonValue>> {
        for attempt in 1..=self.config.max_attempts {
            match self.chat_once(prompt).await {
                Ok(content) => {
                    debug!(
                        attempt,
                        response_len = content.len(),
                        "LLM extraction call succeeded"
                    );
                    return Ok(find_json_array(&content));
                }
                Err(e) if e.retryable && attempt < self.config.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e.message,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.retryable => {
                    warn!(error = %e.message, "LLM retries exhausted, yielding no records");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(Error::Inference(e.message));
                }
            }
        }
        Ok(None)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Scan response text for the outermost JSON array.
///
/// Tries the whole string first, then the substring from the first `[`
/// to the last `]`. Anything else parses to `None`.
pub fn find_json_array(content: &str) -> Option<JsonValue> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str::<JsonValue>(trimmed) {
        if value.is_array() {
            return Some(value);
        }
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<JsonValue>(&trimmed[start..=end])
        .ok()
        .filter(|v| v.is_array())
}
