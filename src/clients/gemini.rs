use crate::config::KeyFromEnv;
use crate::error::TransportError;
use crate::transport::{RawResponse, ResponseBody, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the Gemini `generateContent` transport
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: GeminiTransport::find_key().unwrap_or_default(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[derive(Clone, Debug)]
pub struct GeminiTransport {
    config: GeminiConfig,
    client: Client,
}

impl KeyFromEnv for GeminiTransport {
    const KEY_NAME: &'static str = "GEMINI_API_KEY";
}

impl Default for GeminiTransport {
    fn default() -> Self {
        Self::new(GeminiConfig::default())
    }
}

impl GeminiTransport {
    pub fn new(config: GeminiConfig) -> Self {
        info!(model = %config.model, "Creating new Gemini transport");
        if config.api_key.is_empty() {
            warn!("{} is not set; requests will be rejected by the provider", Self::KEY_NAME);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });
        Self { config, client }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    #[instrument(skip(self, payload), fields(model = %self.config.model))]
    async fn send(&self, payload: Value) -> Result<RawResponse, TransportError> {
        debug!("Sending request to Gemini API");
        let response = self
            .client
            .post(self.config.url())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key.
                let e = e.without_url();
                error!(error = %e, "HTTP request failed");
                TransportError::NoResponse(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received response from Gemini API");

        let text = response.text().await.map_err(|e| {
            let e = e.without_url();
            error!(error = %e, "Failed to read Gemini response body");
            TransportError::NoResponse(e.to_string())
        })?;

        if status.as_u16() == TransportError::RATE_LIMIT_STATUS {
            warn!("Gemini API rate limit exceeded");
        }
        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(TransportError::Status { status: status.as_u16(), body: text });
        }

        info!(response_len = text.len(), "Successfully received Gemini response");
        Ok(RawResponse { status: status.as_u16(), body: ResponseBody::from_text(text) })
    }

    fn clone_box(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_contains_model_and_key() {
        let config = GeminiConfig::default()
            .with_api_key("k3y".to_string())
            .with_model("gemini-test".to_string())
            .with_endpoint("https://example.invalid/v1beta/".to_string());
        assert_eq!(
            config.url(),
            "https://example.invalid/v1beta/models/gemini-test:generateContent?key=k3y"
        );
    }
}
