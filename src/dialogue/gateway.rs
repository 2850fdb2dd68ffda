// src/dialogue/gateway.rs — Bounded single-shot access to the text model

use std::sync::Arc;
use std::time::Duration;

use crate::infra::errors::RagnosisError;
use crate::provider::{ChatRequest, Message, ModelProvider};

/// Advisory generation options. Nothing here is enforced locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    pub max_output_tokens: Option<u32>,
}

/// Wraps a provider with a timeout. One attempt per call, no retries.
pub struct AiGateway {
    provider: Arc<dyn ModelProvider>,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
    system: Option<String>,
}

impl AiGateway {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout,
            temperature: None,
            system: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.trim().is_empty()).then_some(system);
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    /// Submit `prompt` and wait at most the configured timeout.
    pub async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, RagnosisError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: options.max_output_tokens,
            temperature: self.temperature,
            system: self.system.clone(),
        };

        let started = std::time::Instant::now();
        let response = match tokio::time::timeout(self.timeout, self.provider.chat(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(
                    provider = self.provider.id(),
                    retriable = e.is_retriable(),
                    "Model call failed: {}",
                    e
                );
                return Err(e);
            }
            Err(_) => {
                let after_ms = self.timeout.as_millis() as u64;
                tracing::warn!(provider = self.provider.id(), after_ms, "Model call timed out");
                return Err(RagnosisError::Timeout { after_ms });
            }
        };

        let text = response.content.trim();
        if text.is_empty() {
            tracing::warn!(provider = self.provider.id(), "Model returned no text");
            return Err(RagnosisError::EmptyCompletion);
        }

        tracing::debug!(
            provider = self.provider.id(),
            model = %self.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call complete"
        );
        Ok(text.to_string())
    }
}
