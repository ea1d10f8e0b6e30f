// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude scoring adapter for Leadflow.
//!
//! Implements [`ScoringAdapter`] on top of the Anthropic Messages API. The
//! model only ever sees the four derived lead facts in [`ScoringInput`] and
//! its answer is advisory: nothing here changes a lead's stage.

pub mod client;
pub mod types;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use leadflow_config::model::AnthropicConfig;
use leadflow_core::{
    AdapterType, AiResult, HealthStatus, LeadflowError, PluginAdapter, ScoringAdapter,
    ScoringInput,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

const SYSTEM_PROMPT: &str = "You are a CRM AI assistant that evaluates sales leads.
Analyze the provided lead data and return a JSON object with exactly these fields:
- score: float between 0.0 and 1.0 (probability of successful deal)
- recommendation: one of \"transfer_to_sales\", \"continue_nurturing\", \"mark_as_lost\"
- reason: brief explanation in English (1-2 sentences)

Return ONLY valid JSON, no markdown, no extra text.";

/// Recommendations the prompt asks for. Others are accepted but logged.
const KNOWN_RECOMMENDATIONS: &[&str] = &["transfer_to_sales", "continue_nurturing", "mark_as_lost"];

/// Leading and trailing Markdown code fences around a JSON payload.
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json)?\s*|\s*```$").unwrap());

/// Claude-backed lead scorer implementing [`ScoringAdapter`].
///
/// Constructed without an API key the scorer still exists, but every
/// [`ScoringAdapter::score`] call fails with
/// [`LeadflowError::ScoringUnavailable`].
pub struct AnthropicScorer {
    client: Option<AnthropicClient>,
    max_tokens: u32,
}

impl AnthropicScorer {
    /// Creates a scorer from configuration.
    ///
    /// # API Key Resolution
    /// 1. `config.api_key` if set and non-empty
    /// 2. `ANTHROPIC_API_KEY` environment variable
    /// 3. Otherwise the scorer is built in unavailable mode
    pub fn new(config: &AnthropicConfig) -> Result<Self, LeadflowError> {
        let api_key = resolve_api_key(
            config.api_key.as_deref(),
            std::env::var("ANTHROPIC_API_KEY").ok(),
        );

        let client = match api_key {
            Some(key) => {
                let client = AnthropicClient::new(
                    &key,
                    &config.api_version,
                    config.model.clone(),
                    Duration::from_secs(config.timeout_secs),
                    config.max_retries,
                )?;
                info!(model = %config.model, "Anthropic scorer initialized");
                Some(client)
            }
            None => {
                warn!("no Anthropic API key configured; lead analysis will be unavailable");
                None
            }
        };

        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    /// Creates a scorer with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: Option<AnthropicClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    fn build_request(&self, client: &AnthropicClient, input: &ScoringInput) -> MessageRequest {
        MessageRequest {
            model: client.model().to_string(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: user_prompt(input),
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicScorer {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Scoring
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("no Anthropic API key configured".into()),
        })
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl ScoringAdapter for AnthropicScorer {
    async fn score(&self, input: &ScoringInput) -> Result<AiResult, LeadflowError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| LeadflowError::ScoringUnavailable {
                message: "ANTHROPIC_API_KEY is not configured".into(),
                source: None,
            })?;

        let request = self.build_request(client, input);
        let response = client.complete_message(&request).await?;
        debug!(
            response_id = %response.id,
            output_tokens = response.usage.output_tokens,
            "scoring response"
        );

        let text = response.first_text().ok_or_else(|| LeadflowError::Scoring {
            message: "response contained no text block".into(),
            source: None,
        })?;
        parse_ai_result(text)
    }
}

/// Picks the API key: a non-empty configured key wins over the environment.
fn resolve_api_key(config_key: Option<&str>, env_key: Option<String>) -> Option<String> {
    match config_key {
        Some(key) if !key.trim().is_empty() => Some(key.to_string()),
        _ => env_key.filter(|key| !key.trim().is_empty()),
    }
}

/// Renders the four lead facts the model is allowed to see.
fn user_prompt(input: &ScoringInput) -> String {
    format!(
        "Evaluate this lead:
- Source: {source}
- Current cold stage: {stage}
- Number of communications: {messages}
- Business domain specified: {domain}

Return JSON with score, recommendation, reason.",
        source = input.source,
        stage = input.stage,
        messages = input.messages_count,
        domain = if input.has_business_domain { "yes" } else { "no" },
    )
}

#[derive(Debug, Deserialize)]
struct RawScore {
    score: f64,
    recommendation: String,
    reason: String,
}

/// Parses the model's reply into an [`AiResult`], tolerating code fences.
fn parse_ai_result(raw: &str) -> Result<AiResult, LeadflowError> {
    let json = CODE_FENCE.replace_all(raw.trim(), "");
    let parsed: RawScore = serde_json::from_str(&json).map_err(|e| LeadflowError::Scoring {
        message: format!("model reply is not the expected JSON: {e}"),
        source: Some(Box::new(e)),
    })?;

    let result = AiResult {
        score: parsed.score,
        recommendation: parsed.recommendation,
        reason: parsed.reason,
    };
    if !result.has_valid_score() {
        return Err(LeadflowError::Scoring {
            message: format!("model returned score {} outside [0, 1]", result.score),
            source: None,
        });
    }
    if !KNOWN_RECOMMENDATIONS.contains(&result.recommendation.as_str()) {
        warn!(recommendation = %result.recommendation, "unrecognised recommendation from model");
    }
    Ok(result)
}
