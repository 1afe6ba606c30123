//! Model invocation adapter
//!
//! The rest of the system treats a language model as an opaque async
//! function from rendered prompt messages to generated text, optionally
//! delivered as a stream of fragments. Concrete clients live here and
//! stay thin; retries and backoff are their concern, never the caller's.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use mock::ScriptedProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("malformed response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// One prompt message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Token accounting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completed generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Generation parameters
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Incremental text fragments, delivered in arrival order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A model backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run one generation to completion
    async fn invoke(&self, params: ChatParams) -> Result<Completion>;

    /// Run one generation as a fragment stream.
    ///
    /// Backends without native streaming fall back to a single fragment
    /// holding the full completion; consumers concatenate either way.
    async fn stream(&self, params: ChatParams) -> Result<TextStream> {
        let completion = self.invoke(params).await?;
        let fragments: Vec<Result<String>> = vec![Ok(completion.text)];
        Ok(Box::pin(futures_util::stream::iter(fragments)))
    }

    fn name(&self) -> &str;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Split an HTTP byte stream into complete text lines.
///
/// Carries partial lines across chunk boundaries; a trailing line without
/// a newline is flushed when the underlying stream ends.
pub(crate) fn line_stream(response: reqwest::Response) -> impl Stream<Item = Result<String>> + Send {
    struct LineState {
        inner: Pin<Box<dyn Stream<Item = std::result::Result<Vec<u8>, reqwest::Error>> + Send>>,
        buffer: String,
        pending: VecDeque<String>,
        finished: bool,
    }

    let state = LineState {
        inner: Box::pin(response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()))),
        buffer: String::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(line) = st.pending.pop_front() {
                return Some((Ok(line), st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    while let Some(pos) = st.buffer.find('\n') {
                        let line = st.buffer[..pos].trim_end_matches('\r').to_string();
                        st.buffer.drain(..=pos);
                        st.pending.push_back(line);
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(ProviderError::Request(e)), st));
                }
                None => {
                    st.finished = true;
                    if !st.buffer.is_empty() {
                        let line = std::mem::take(&mut st.buffer);
                        return Some((Ok(line), st));
                    }
                    return None;
                }
            }
        }
    })
}
