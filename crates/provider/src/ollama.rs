//! Ollama local client
//!
//! Talks to a local Ollama daemon over `/api/chat`; streaming responses
//! arrive as newline-delimited JSON objects.

use futures_util::{future, StreamExt};
use reqwest::Client;
use serde_json::json;
use tracing::trace;

use crate::{
    line_stream, ChatParams, Completion, Provider, ProviderError, Result, TextStream, Usage,
};

/// Ollama chat client
pub struct OllamaProvider {
    client: Client,
    api_base: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(api_base: Option<String>, default_model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.unwrap_or_else(|| "http://localhost:11434".to_string()),
            default_model: default_model.unwrap_or_else(|| "llama3".to_string()),
        }
    }

    fn build_request(&self, params: &ChatParams, stream: bool) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| json!({ "role": &m.role, "content": &m.content }))
            .collect();

        json!({
            "model": params.model,
            "messages": messages,
            "stream": stream,
            "options": {
                "temperature": params.temperature,
                "num_predict": params.max_tokens,
            }
        })
    }

    async fn send(&self, body: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}/api/chat", self.api_base);
        trace!("posting to {}", url);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let json: serde_json::Value = response.json().await.unwrap_or_default();
            let error = json["error"].as_str().unwrap_or("unknown error").to_string();
            return Err(ProviderError::Api(error));
        }
        Ok(response)
    }
}

/// One NDJSON line, decoded
enum ChatEvent {
    Fragment(String),
    Done,
    Skip,
}

fn parse_chat_line(line: &str) -> ChatEvent {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(line.trim()) else {
        return ChatEvent::Skip;
    };
    if value["done"].as_bool() == Some(true) {
        return ChatEvent::Done;
    }
    let fragment = value["message"]["content"].as_str().unwrap_or_default();
    if fragment.is_empty() {
        ChatEvent::Skip
    } else {
        ChatEvent::Fragment(fragment.to_string())
    }
}

#[async_trait::async_trait]
impl Provider for OllamaProvider {
    async fn invoke(&self, params: ChatParams) -> Result<Completion> {
        let body = self.build_request(&params, false);
        let response = self.send(body).await?;
        let json: serde_json::Value = response.json().await?;

        let text = json["message"]["content"]
            .as_str()
            .ok_or(ProviderError::InvalidResponse)?
            .to_string();

        let prompt = json["prompt_eval_count"].as_u64().unwrap_or(0) as u32;
        let completion = json["eval_count"].as_u64().unwrap_or(0) as u32;

        Ok(Completion {
            text,
            finish_reason: "stop".to_string(),
            usage: Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            },
        })
    }

    async fn stream(&self, params: ChatParams) -> Result<TextStream> {
        let body = self.build_request(&params, true);
        let response = self.send(body).await?;

        let fragments = line_stream(response)
            .map(|line| line.map(|l| parse_chat_line(&l)))
            .take_while(|event| future::ready(!matches!(event, Ok(ChatEvent::Done))))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(ChatEvent::Fragment(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            });

        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        // A local daemon needs no credentials
        true
    }
}
