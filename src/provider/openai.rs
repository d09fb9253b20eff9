// src/provider/openai.rs — OpenAI-compatible Chat Completions provider

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, TokenUsage};
use crate::infra::errors::ResearchError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into())
    }

    /// Point at any OpenAI-compatible endpoint (Azure proxies, Ollama, vLLM, ...).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Build the JSON body for `/chat/completions`.
pub(crate) fn request_body(request: &ChatRequest) -> serde_json::Value {
    let mut msgs = Vec::new();
    if let Some(system) = &request.system {
        msgs.push(serde_json::json!({"role": "system", "content": system}));
    }
    for m in &request.messages {
        msgs.push(serde_json::json!({"role": m.role.as_str(), "content": m.content}));
    }

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": msgs,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    if let Some(temp) = request.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    body
}

/// Extract content, usage and stop reason from a completion response.
pub(crate) fn parse_response(resp: &serde_json::Value) -> ChatResponse {
    let choice = &resp["choices"][0];
    let content = choice["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let usage = TokenUsage {
        input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    };

    let stop_reason = match choice["finish_reason"].as_str() {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    };

    ChatResponse {
        content,
        usage,
        stop_reason,
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ResearchError> {
        let body = request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ResearchError::Provider {
                provider: "openai".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(5000);
            return Err(ResearchError::RateLimited {
                provider: "openai".into(),
                retry_after_ms,
            });
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ResearchError::Provider {
                provider: "openai".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| ResearchError::Provider {
                provider: "openai".into(),
                message: format!("Failed to parse response: {}", e),
                retriable: false,
            })?;

        let parsed = parse_response(&resp);
        tracing::debug!(
            model = %request.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Chat completion received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Message;

    #[test]
    fn test_request_body_with_system_and_params() {
        let req = ChatRequest {
            model: "gpt-4-turbo-2024-04-09".into(),
            messages: vec![Message::user("hi"), Message::assistant("hello")],
            max_tokens: Some(2000),
            temperature: Some(0.2),
            system: Some("be terse".into()),
        };
        let body = request_body(&req);
        assert_eq!(body["model"], "gpt-4-turbo-2024-04-09");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["content"], "hello");
        assert_eq!(body["max_tokens"], 2000);
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_request_body_omits_unset_params() {
        let req = ChatRequest {
            model: "m".into(),
            messages: vec![Message::user("hi")],
            ..Default::default()
        };
        let body = request_body(&req);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response() {
        let resp = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Plan: look at margins"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7}
        });
        let parsed = parse_response(&resp);
        assert_eq!(parsed.content, "Plan: look at margins");
        assert_eq!(parsed.usage.total(), 19);
        assert!(matches!(parsed.stop_reason, StopReason::EndTurn));
    }

    #[test]
    fn test_parse_response_missing_fields() {
        let parsed = parse_response(&serde_json::json!({}));
        assert_eq!(parsed.content, "");
        assert_eq!(parsed.usage.total(), 0);
        assert!(matches!(parsed.stop_reason, StopReason::Unknown));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let p = OpenAIProvider::with_base_url("k".into(), "http://localhost:11434/v1/".into());
        assert_eq!(p.base_url, "http://localhost:11434/v1");
        assert_eq!(p.id(), "openai");
    }
}
