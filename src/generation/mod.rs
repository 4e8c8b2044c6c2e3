//! Generative-text client with ordered multi-model fallback.
//!
//! `GenerationClient` walks a list of model identifiers strictly in order and
//! returns the first non-empty success. Attempts are sequential — the
//! fallback decision needs each outcome before trying the next model, and
//! speculative parallel calls would only multiply quota consumption.

mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::DEFAULT_CALL_TIMEOUT;
use crate::error::{GenerationAttempt, GenerationError, ProviderError};

/// How the provider should shape its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Free text, accepted opaquely.
    Text,
    /// The provider is asked for JSON output.
    Json,
}

/// One generation request, independent of any vendor.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub format: OutputFormat,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: OutputFormat::Text,
        }
    }

    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: OutputFormat::Json,
        }
    }
}

/// Capability interface for a text-generation vendor.
///
/// One adapter per vendor; the client depends only on this trait, which keeps
/// test doubles trivial.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Vendor name for logging.
    fn name(&self) -> &str;

    /// Run one request against one model.
    async fn generate(
        &self,
        model_id: &str,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError>;
}

/// Multi-model fallback client.
pub struct GenerationClient {
    provider: Arc<dyn GenerationProvider>,
    models: Vec<String>,
    call_timeout: Duration,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn GenerationProvider>, models: Vec<String>) -> Self {
        Self {
            provider,
            models,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Obtain one successful response, trying models strictly in order.
    ///
    /// - Non-empty success returns immediately; remaining models are skipped.
    /// - A transient failure (including a per-call timeout or empty output)
    ///   is logged and the next model is tried.
    /// - An account-level failure (429/403) stops the loop: the remaining
    ///   models share the same quota and credentials and would fail the same
    ///   way.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut attempts: Vec<GenerationAttempt> = Vec::new();

        for model_id in &self.models {
            debug!(provider = self.provider.name(), model = %model_id, "requesting generation");

            let outcome =
                match tokio::time::timeout(self.call_timeout, self.provider.generate(model_id, request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::transport(format!(
                        "timed out after {:?}",
                        self.call_timeout
                    ))),
                };

            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(model = %model_id, length = text.len(), "generation succeeded");
                    return Ok(text);
                }
                Ok(_) => {
                    warn!(model = %model_id, "model returned empty output");
                    attempts.push(GenerationAttempt {
                        model_id: model_id.clone(),
                        error: "empty response".into(),
                    });
                }
                Err(err) => {
                    warn!(model = %model_id, error = %err, "model attempt failed");
                    let account_level = err.is_account_level();
                    attempts.push(GenerationAttempt {
                        model_id: model_id.clone(),
                        error: err.to_string(),
                    });
                    if account_level {
                        debug!(model = %model_id, "account-level failure, stopping fallback");
                        break;
                    }
                }
            }
        }

        Err(GenerationError::Exhausted { attempts })
    }
}
