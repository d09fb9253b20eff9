// src/agent/mod.rs — Research capabilities backed by a chat-completion model

pub mod parser;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::capabilities::Capabilities;
use crate::core::types::{ReflectionResult, Transcript};
use crate::data::Dataset;
use crate::infra::config::Config;
use crate::infra::errors::ResearchError;
use crate::provider::{ChatRequest, Message, ModelProvider};

/// One chat request per capability, all against the same model.
pub struct LlmCapabilities {
    provider: Arc<dyn ModelProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    sample_rows: usize,
}

impl LlmCapabilities {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 2000,
            sample_rows: 5,
        }
    }

    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &Config) -> Self {
        Self::new(provider, config.model.model.clone())
            .with_temperature(config.model.temperature)
            .with_max_tokens(config.model.max_tokens)
            .with_sample_rows(config.analysis.sample_rows)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, step: &str, messages: Vec<Message>) -> Result<String, ResearchError> {
        let response = self
            .provider
            .chat(ChatRequest {
                model: self.model.clone(),
                messages,
                max_tokens: Some(self.max_tokens),
                temperature: Some(self.temperature),
                system: Some(prompts::SYSTEM_PROMPT.to_string()),
            })
            .await?;

        tracing::debug!(
            step,
            tokens = response.usage.total(),
            "Capability call complete"
        );

        let content = response.content.trim();
        if content.is_empty() {
            return Err(ResearchError::Provider {
                provider: self.provider.id().to_string(),
                message: format!("empty response for {step}"),
                retriable: false,
            });
        }
        Ok(content.to_string())
    }

    /// Prior turns followed by a new user message.
    fn with_history(transcript: &Transcript, prompt: String) -> Vec<Message> {
        let mut messages = transcript.turns().to_vec();
        messages.push(Message::user(prompt));
        messages
    }
}

#[async_trait]
impl Capabilities<Dataset> for LlmCapabilities {
    async fn plan(&self, query: &str) -> Result<String, ResearchError> {
        self.complete("plan", vec![Message::user(prompts::plan_prompt(query))])
            .await
    }

    async fn execute(&self, plan: &str, dataset: &Dataset) -> Result<String, ResearchError> {
        let profile = dataset.profile(self.sample_rows);
        self.complete(
            "execute",
            vec![Message::user(prompts::execute_prompt(plan, &profile))],
        )
        .await
    }

    async fn reflect(
        &self,
        query: &str,
        transcript: &Transcript,
        findings: &str,
    ) -> Result<ReflectionResult, ResearchError> {
        let messages = Self::with_history(transcript, prompts::reflect_prompt(query, findings));
        let raw = self.complete("reflect", messages).await?;
        parser::parse_reflection(&raw)
    }

    async fn identify_gaps(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<String, ResearchError> {
        let messages = Self::with_history(transcript, prompts::gaps_prompt(query));
        self.complete("identify_gaps", messages).await
    }

    async fn revise(&self, plan: &str, gaps: &str) -> Result<String, ResearchError> {
        self.complete(
            "revise",
            vec![Message::user(prompts::revise_prompt(plan, gaps))],
        )
        .await
    }

    async fn synthesize(
        &self,
        query: &str,
        transcript: &Transcript,
    ) -> Result<String, ResearchError> {
        let messages = Self::with_history(transcript, prompts::synthesize_prompt(query));
        self.complete("synthesize", messages).await
    }
}
