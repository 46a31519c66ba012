//! HTTP generation provider speaking the OpenAI-style chat-completions
//! wire format. Any endpoint implementing that contract works.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::provider::{Generated, GenerationProvider, GenerationRequest, LlmError, TokenUsage};

/// Configuration for an [`HttpProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    /// Base URL like `https://api.example.com` (no trailing slash).
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: WireUsage,
    #[serde(default)]
    model: Option<String>,
}

/// Generation provider over a chat-completions HTTP endpoint.
pub struct HttpProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpProvider {
    pub fn new(mut config: HttpProviderConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl GenerationProvider for HttpProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated, LlmError> {
        let started = Instant::now();
        let wire = WireRequest {
            model: &self.config.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = self.endpoint();
        info!(url = %url, model = %self.config.model, "requesting generation");
        let mut http_request = self.client.post(&url).json(&wire);
        if let Some(key) = &self.config.api_key {
            http_request = http_request.bearer_auth(key);
        }
        let response = http_request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::Empty)?;

        let elapsed = started.elapsed();
        info!(
            chars = text.len(),
            total_tokens = parsed.usage.prompt_tokens + parsed.usage.completion_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "generation complete"
        );
        Ok(Generated {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            usage: TokenUsage {
                prompt_tokens: parsed.usage.prompt_tokens,
                completion_tokens: parsed.usage.completion_tokens,
            },
            elapsed,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
