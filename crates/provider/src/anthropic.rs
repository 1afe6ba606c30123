//! Anthropic messages client

use reqwest::Client;
use serde_json::json;
use tracing::trace;

use crate::{ChatParams, Completion, Provider, ProviderError, Result, Usage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic `/v1/messages` client
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            default_model: default_model.unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        // System prompts travel in a dedicated field, not the message list
        let system: Vec<&str> = params
            .messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .collect();

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| json!({ "role": &m.role, "content": &m.content }))
            .collect();

        let mut body = json!({
            "model": params.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion> {
        let text = json["content"]
            .get(0)
            .and_then(|block| block["text"].as_str())
            .ok_or(ProviderError::InvalidResponse)?
            .to_string();

        let finish_reason = json["stop_reason"].as_str().unwrap_or("stop").to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            let prompt = usage
                .get("input_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            let completion = usage
                .get("output_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32;
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }
        } else {
            Usage::default()
        };

        Ok(Completion {
            text,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn invoke(&self, params: ChatParams) -> Result<Completion> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/v1/messages", self.api_base);
        trace!("posting to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.build_request(&params))
            .send()
            .await?;

        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(error));
        }

        self.parse_response(json)
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    #[test]
    fn test_build_request_splits_system() {
        let p = AnthropicProvider::new("sk-ant-test", None, None);
        let params = ChatParams {
            model: "claude-sonnet-4-20250514".to_string(),
            messages: vec![Message::system("be terse"), Message::user("hello")],
            max_tokens: 256,
            temperature: 0.3,
        };

        let body = p.build_request(&params);
        assert_eq!(body["system"], "be terse");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn test_parse_response() {
        let p = AnthropicProvider::new("sk-ant-test", None, None);
        let json = json!({
            "content": [{ "type": "text", "text": "Hello!" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 4 }
        });

        let completion = p.parse_response(json).unwrap();
        assert_eq!(completion.text, "Hello!");
        assert_eq!(completion.finish_reason, "end_turn");
        assert_eq!(completion.usage.total_tokens, 14);
    }

    #[test]
    fn test_parse_response_missing_content() {
        let p = AnthropicProvider::new("sk-ant-test", None, None);
        let result = p.parse_response(json!({ "content": [] }));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }
}
