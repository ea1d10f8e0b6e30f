// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles request construction,
//! authentication, and transient error retry. Failures are classified for
//! the scoring collaborator: anything that means "the oracle could not be
//! reached" becomes [`LeadflowError::ScoringUnavailable`], anything that
//! means "the oracle answered badly" becomes [`LeadflowError::Scoring`].

use std::time::Duration;

use leadflow_core::LeadflowError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Base URL for the Anthropic Messages API.
const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Delay before retrying a transient failure.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    /// * `model` - Model identifier used for every request
    /// * `timeout` - Per-request timeout
    /// * `max_retries` - Retries after a transient response
    pub fn new(
        api_key: &str,
        api_version: &str,
        model: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, LeadflowError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| LeadflowError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                LeadflowError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LeadflowError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            model,
            max_retries,
            retry_delay: RETRY_DELAY,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Overrides the retry delay (for testing).
    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends a request and returns the full response.
    ///
    /// On transient errors (429, 500, 503, 529), retries up to `max_retries`
    /// times after a fixed delay.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LeadflowError> {
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying scoring request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| LeadflowError::ScoringUnavailable {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "scoring response received");

            if status.is_success() {
                let body = response
                    .text()
                    .await
                    .map_err(|e| LeadflowError::ScoringUnavailable {
                        message: format!("failed to read response body: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return serde_json::from_str(&body).map_err(|e| LeadflowError::Scoring {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let transient = is_transient_error(status);
            if transient && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                continue;
            }

            let message = describe_error(status, &body);
            return Err(if transient {
                LeadflowError::ScoringUnavailable {
                    message,
                    source: None,
                }
            } else {
                LeadflowError::Scoring {
                    message,
                    source: None,
                }
            });
        }

        Err(LeadflowError::ScoringUnavailable {
            message: "scoring request failed after retries".into(),
            source: None,
        })
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "Anthropic API error ({}): {}",
            api_err.error.type_, api_err.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
