// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock scoring adapter for deterministic testing.
//!
//! `MockScorer` implements `ScoringAdapter` with pre-configured results,
//! so analysis can be tested without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadflow_core::{
    AdapterType, AiResult, HealthStatus, LeadflowError, PluginAdapter, ScoringAdapter,
    ScoringInput,
};

/// A mock scorer that returns pre-configured results.
///
/// Results are popped from a FIFO queue. When the queue is empty, a default
/// `continue_nurturing` result with score 0.5 is returned. Every input seen
/// is recorded for later inspection.
pub struct MockScorer {
    results: Arc<Mutex<VecDeque<Result<AiResult, LeadflowError>>>>,
    inputs: Arc<Mutex<Vec<ScoringInput>>>,
    unavailable: bool,
    delay: Option<Duration>,
}

impl MockScorer {
    /// Create a mock scorer with an empty result queue.
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(VecDeque::new())),
            inputs: Arc::new(Mutex::new(Vec::new())),
            unavailable: false,
            delay: None,
        }
    }

    /// Create a mock scorer pre-loaded with the given results.
    pub fn with_results(results: Vec<AiResult>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    /// A scorer that behaves like one with no API key configured.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    /// Sleep for `delay` before answering, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful result.
    pub async fn push_result(&self, result: AiResult) {
        self.results.lock().await.push_back(Ok(result));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: LeadflowError) {
        self.results.lock().await.push_back(Err(error));
    }

    /// All inputs received so far, in call order.
    pub async fn inputs(&self) -> Vec<ScoringInput> {
        self.inputs.lock().await.clone()
    }

    /// Convenience constructor for an [`AiResult`].
    pub fn result(score: f64, recommendation: &str, reason: &str) -> AiResult {
        AiResult {
            score,
            recommendation: recommendation.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockScorer {
    fn name(&self) -> &str {
        "mock-scorer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Scoring
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(if self.unavailable {
            HealthStatus::Degraded("mock scorer is unavailable".into())
        } else {
            HealthStatus::Healthy
        })
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl ScoringAdapter for MockScorer {
    async fn score(&self, input: &ScoringInput) -> Result<AiResult, LeadflowError> {
        self.inputs.lock().await.push(input.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(LeadflowError::ScoringUnavailable {
                message: "mock scorer is unavailable".into(),
                source: None,
            });
        }
        self.results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Self::result(0.5, "continue_nurturing", "mock result")))
    }
}
