//! OpenAI-compatible client
//!
//! Talks to any `/chat/completions` endpoint; a custom `api_base` covers
//! OpenRouter-style gateways and self-hosted proxies.

use futures_util::{future, StreamExt};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

use crate::{
    line_stream, ChatParams, Completion, Provider, ProviderError, Result, TextStream, Usage,
};

/// OpenAI-compatible chat client
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            default_model: default_model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams, stream: bool) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| json!({ "role": &m.role, "content": &m.content }))
            .collect();

        let mut body = json!({
            "model": params.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if stream {
            body["stream"] = json!(true);
        }
        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let text = message["content"].as_str().unwrap_or_default().to_string();
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                prompt_tokens: usage
                    .get("prompt_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                completion_tokens: usage
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                total_tokens: usage
                    .get("total_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
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

    async fn send(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        trace!("posting to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let json: serde_json::Value = response.json().await.unwrap_or_default();
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(error));
        }
        Ok(response)
    }
}

/// One server-sent event line, decoded
enum SseEvent {
    Fragment(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    match serde_json::from_str::<serde_json::Value>(data) {
        Ok(value) => {
            let fragment = value["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or_default();
            if fragment.is_empty() {
                SseEvent::Skip
            } else {
                SseEvent::Fragment(fragment.to_string())
            }
        }
        Err(_) => SseEvent::Skip,
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn invoke(&self, params: ChatParams) -> Result<Completion> {
        let body = self.build_request(&params, false);
        let response = self.send(body).await?;
        let json: serde_json::Value = response.json().await?;

        debug!(
            "completion finished: {}",
            json["choices"][0]["finish_reason"].as_str().unwrap_or("?")
        );
        self.parse_response(json)
    }

    async fn stream(&self, params: ChatParams) -> Result<TextStream> {
        let body = self.build_request(&params, true);
        let response = self.send(body).await?;

        let fragments = line_stream(response)
            .map(|line| line.map(|l| parse_sse_line(&l)))
            .take_while(|event| future::ready(!matches!(event, Ok(SseEvent::Done))))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(SseEvent::Fragment(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
