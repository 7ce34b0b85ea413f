/// LLM Client: the single point of entry for all Claude API calls in the reviewer.
///
/// No other module talks to the Anthropic API directly. The client sends one
/// request per attempt, retries failed attempts with a fixed delay, and returns
/// the first text block of the response envelope unaltered. Parsing the text is
/// the schema validator's job.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod messages;
pub mod transport;

pub use messages::{ContentBlock, Message, MessagesRequest};
pub use transport::{HttpTransport, RawResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every review. Hardcoded so reviews stay comparable.
pub const MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Total attempts per completion, including the first one.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response envelope: {0}")]
    Envelope(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Sends a serialized request to the completion endpoint.
///
/// Implementations return the response for any HTTP status; only failures to
/// get a response at all are errors. Status handling and retries live in
/// [`LlmClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &MessagesRequest<'_>) -> Result<RawResponse, LlmError>;
}

/// Successful Messages API response body.
#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    /// Decodes a raw response body into the envelope, naming what was wrong
    /// when the body has a different shape.
    pub fn decode(body: &str) -> Result<Self, LlmError> {
        serde_json::from_str(body).map_err(|e| LlmError::Envelope(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The LLM client used by the review pipeline.
#[derive(Clone)]
pub struct LlmClient {
    transport: Arc<dyn Transport>,
    retry_delay: Duration,
}

impl LlmClient {
    /// Builds a client that talks to the Anthropic API over HTTPS.
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let transport = HttpTransport::new(api_key, ANTHROPIC_API_URL)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sends one chat completion and returns the model's text unaltered.
    ///
    /// Transport failures and non-success statuses are retried up to
    /// `MAX_ATTEMPTS` times in total; the last error is returned as-is.
    /// `temperature` defaults to [`DEFAULT_TEMPERATURE`].
    pub async fn get_chat_completion(
        &self,
        max_tokens: u32,
        messages: Vec<Message>,
        system: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens,
            temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
            system,
            messages,
        };

        let body = self.send_with_retry(&request).await?;
        let response = LlmResponse::decode(&body)?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }
        if response.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Completion hit max_tokens={max_tokens}; output is likely truncated");
        }

        let text = response.text().ok_or(LlmError::EmptyContent)?;
        info!("Received chat completion from Anthropic ({} chars)", text.chars().count());
        Ok(text.to_string())
    }

    async fn send_with_retry(&self, request: &MessagesRequest<'_>) -> Result<String, LlmError> {
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    error!("Error during API request attempt {attempt}: {e}");
                    if attempt >= MAX_ATTEMPTS {
                        error!("Failed after {MAX_ATTEMPTS} attempts");
                        return Err(e);
                    }
                    info!("Retrying in {}ms...", self.retry_delay.as_millis());
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, request: &MessagesRequest<'_>) -> Result<String, LlmError> {
        let response = self.transport.post(request).await?;

        if !(200..300).contains(&response.status) {
            // Prefer the API's own error message when the body carries one
            let message = serde_json::from_str::<AnthropicError>(&response.body)
                .map(|e| e.error.message)
                .unwrap_or(response.body);
            return Err(LlmError::Api {
                status: response.status,
                message,
            });
        }

        Ok(response.body)
    }
}
