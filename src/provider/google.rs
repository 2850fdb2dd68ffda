// src/provider/google.rs — Google Generative AI (Gemini) provider

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, StopReason, TokenUsage};
use crate::infra::errors::RagnosisError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different endpoint (proxies, regional gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the Gemini request body from a ChatRequest.
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }],
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
        });

        if let Some(ref system) = request.system {
            body["system_instruction"] = serde_json::json!({
                "parts": [{ "text": system }],
            });
        }

        let mut gen_config = serde_json::json!({});
        if let Some(max_tokens) = request.max_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            gen_config["temperature"] = serde_json::json!(temp);
        }
        if gen_config != serde_json::json!({}) {
            body["generationConfig"] = gen_config;
        }

        body
    }
}

/// Extract text, usage and finish reason from a generateContent response.
fn parse_response(resp: &serde_json::Value) -> ChatResponse {
    let content = resp["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    let usage = TokenUsage {
        input_tokens: resp["usageMetadata"]["promptTokenCount"]
            .as_u64()
            .unwrap_or(0) as u32,
        output_tokens: resp["usageMetadata"]["candidatesTokenCount"]
            .as_u64()
            .unwrap_or(0) as u32,
    };

    let stop_reason = match resp["candidates"][0]["finishReason"].as_str() {
        Some("STOP") => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("SAFETY") => StopReason::Safety,
        _ => StopReason::Unknown,
    };

    ChatResponse {
        content,
        usage,
        stop_reason,
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    fn name(&self) -> &str {
        "Google"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, RagnosisError> {
        let body = self.build_request_body(&request);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key,
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let retriable = e.is_timeout() || e.is_connect();
                RagnosisError::Provider {
                    provider: "google".into(),
                    // the URL carries the API key
                    message: e.without_url().to_string(),
                    retriable,
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RagnosisError::RateLimited {
                provider: "google".into(),
                retry_after_ms: 5000,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RagnosisError::Provider {
                provider: "google".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| RagnosisError::Provider {
                provider: "google".into(),
                message: format!("Failed to parse response: {}", e),
                retriable: false,
            })?;

        let parsed = parse_response(&resp);
        if parsed.stop_reason == StopReason::Safety && parsed.content.is_empty() {
            tracing::info!("Gemini withheld a response for safety reasons");
        }
        Ok(parsed)
    }
}
