//! Generation-provider abstraction.
//!
//! The pipeline treats text generation as a replaceable black box: any
//! provider satisfying [`GenerationProvider`] works. Retries and
//! multi-provider fallback belong to the hosting collaborator, not this
//! boundary; the pipeline makes a single attempt under a timeout and
//! degrades to a graph-only answer on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider returned an empty response")]
    Empty,
}

/// One generation request: instructions, context, and the user query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instructions (rules, audience, intent focus).
    pub system: String,
    /// Citation-tagged context followed by the user question.
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub elapsed: Duration,
}

/// A pluggable text-generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated, LlmError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn request_json_roundtrip() {
        let request = GenerationRequest {
            system: "You are a legal assistant.".into(),
            user: "context\n\nQuestion: what is a consumer?".into(),
            max_tokens: 1024,
            temperature: 0.2,
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_tokens, 1024);
        assert!(parsed.user.contains("consumer"));
    }
}
