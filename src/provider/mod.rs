// src/provider/mod.rs — Model provider layer

pub mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infra::config::{ModelConfig, RetrySettings};
use crate::infra::errors::ResearchError;

/// Core trait that chat-completion providers implement.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ResearchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    #[default]
    Unknown,
}

/// Build the configured provider, wrapped with retry.
///
/// The API key is read from the environment variable named in the config,
/// once, here; nothing else in the crate touches the environment.
pub fn from_config(
    model: &ModelConfig,
    retry: &RetrySettings,
) -> Result<Arc<dyn ModelProvider>, ResearchError> {
    let api_key = std::env::var(&model.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ResearchError::NoProvider {
            env_var: model.api_key_env.clone(),
        })?;

    let inner: Arc<dyn ModelProvider> = match model.base_url.as_deref() {
        Some(url) => Arc::new(openai::OpenAIProvider::with_base_url(api_key, url.to_string())),
        None => Arc::new(openai::OpenAIProvider::new(api_key)),
    };

    Ok(Arc::new(retry::RetryProvider::with_config(
        inner,
        retry::RetryConfig::from(retry),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── TokenUsage tests ───────────────────────────────────────

    #[test]
    fn test_token_usage_total() {
        let u = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(u.total(), 150);
    }

    #[test]
    fn test_token_usage_default() {
        let u = TokenUsage::default();
        assert_eq!(u.total(), 0);
    }

    // ─── Message tests ──────────────────────────────────────────

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("Hello").role, Role::User);
        let m = Message::assistant("Sure!");
        assert_eq!(m.role, Role::Assistant);
        assert_eq!(m.content, "Sure!");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    // ─── from_config tests ──────────────────────────────────────

    #[test]
    fn test_from_config_missing_key() {
        let model = ModelConfig {
            api_key_env: "DEEP_RESEARCH_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = from_config(&model, &RetrySettings::default())
            .err()
            .expect("missing key must fail");
        assert!(matches!(err, ResearchError::NoProvider { .. }));
    }

    #[test]
    fn test_stop_reason_default() {
        assert!(matches!(StopReason::default(), StopReason::Unknown));
    }
}
