//! Bounded, time-limited calls to a generation provider.

use std::time::Duration;

use mytuts_core::config::{Config, LlmConfig};
use tracing::{debug, warn};

use crate::provider::{LlmError, LlmProvider, Message};
use crate::providers::create_provider;

#[derive(Debug, thiserror::Error)]
#[error("generation failed after {attempts} attempt(s): {source}")]
pub struct GenerationError {
    pub attempts: u32,
    #[source]
    pub source: LlmError,
}

impl GenerationError {
    /// Explanation suitable for showing to a student.
    pub fn user_message(&self) -> String {
        match &self.source {
            LlmError::RateLimited(_) => {
                "The AI service is receiving too many requests right now. Please wait a moment and try again.".into()
            }
            LlmError::Timeout(_) => {
                "The AI service did not respond in time. Please try again.".into()
            }
            LlmError::NotConfigured(what) => {
                format!("The AI service is not configured ({what}).")
            }
            LlmError::HttpError(_) | LlmError::ApiError { .. } => {
                "The AI service is currently unavailable. Please try again later.".into()
            }
            LlmError::ParseError(_) => {
                "The AI service returned a response that could not be read. Please try again.".into()
            }
        }
    }
}

/// Wraps one provider with a per-attempt timeout and bounded retry.
///
/// Only transient errors are retried. The wait before retry `n` is
/// `backoff * 2^(n-1)`. Dropping the returned future cancels the call.
pub struct GenerationClient {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl GenerationClient {
    pub fn new(provider: Box<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = create_provider(&config.llm, &config.ollama)?;
        Ok(Self::new(provider, &config.llm))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub async fn generate(&self, messages: Vec<Message>) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.attempt(messages.clone()).await {
                Ok(text) => {
                    debug!(provider = self.provider.name(), attempt, chars = text.len(), "generation complete");
                    return Ok(text);
                }
                Err(err) => err,
            };

            if !err.is_transient() || attempt > self.max_retries {
                warn!(provider = self.provider.name(), attempt, error = %err, "generation failed");
                return Err(GenerationError { attempts: attempt, source: err });
            }

            let wait = self.backoff.saturating_mul(1u32 << (attempt - 1).min(16));
            warn!(
                provider = self.provider.name(),
                attempt,
                error = %err,
                retry_in_ms = wait.as_millis() as u64,
                "transient generation failure, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn attempt(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let call = self.provider.complete(messages, self.temperature, self.max_tokens);
        let text = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;
        if text.trim().is_empty() {
            return Err(LlmError::ParseError("empty completion".into()));
        }
        Ok(text)
    }
}
