//! Model handle for stage nodes
//!
//! Bundles the provider with sampling parameters so stage nodes invoke
//! the model with one call. Streamed generations are concatenated in
//! arrival order into a single string; no stage parses or branches on a
//! partial stream.

use std::sync::Arc;

use futures_util::StreamExt;
use opencoder_provider::{ChatParams, Message, Provider, Result};
use tracing::trace;

/// Provider plus sampling parameters for one request
#[derive(Clone)]
pub struct ModelHandle {
    provider: Arc<dyn Provider>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelHandle {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }

    /// The provider behind this handle
    pub fn provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.provider)
    }

    fn params(&self, prompt: String) -> ChatParams {
        ChatParams {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// One generation, returned whole
    pub async fn complete(&self, prompt: String) -> Result<String> {
        let completion = self.provider.invoke(self.params(prompt)).await?;
        Ok(completion.text)
    }

    /// One generation via the fragment stream, collected to a whole
    /// string before returning; the caller never sees partial output.
    pub async fn complete_streaming(&self, prompt: String) -> Result<String> {
        let mut stream = self.provider.stream(self.params(prompt)).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            trace!("fragment: {} chars", fragment.len());
            text.push_str(&fragment);
        }
        Ok(text)
    }
}
