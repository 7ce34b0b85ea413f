use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{LlmError, MessagesRequest, Transport, ANTHROPIC_VERSION};

/// Status and body of one HTTP exchange, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// reqwest-backed transport for the Anthropic Messages endpoint.
pub struct HttpTransport {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(api_key: String, endpoint: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &MessagesRequest<'_>) -> Result<RawResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}
