//! Scripted provider for tests
//!
//! Pops canned responses in order and records every prompt it was given,
//! so state-machine tests can assert both the outputs and the rendered
//! prompt inputs without any network.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{ChatParams, Completion, Provider, ProviderError, Result, TextStream};

enum Scripted {
    Text(String),
    Error(String),
}

/// Provider that replays a fixed script
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion
    pub fn push_text(&self, text: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Text(text.into()));
    }

    /// Queue a transport failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.into()));
    }

    /// Prompts seen so far, one entry per invocation
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of invocations so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn pop(&self, params: &ChatParams) -> Result<String> {
        let rendered = params
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(rendered);

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Error(message)) => Err(ProviderError::Api(message)),
            None => Err(ProviderError::Api("script exhausted".to_string())),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    async fn invoke(&self, params: ChatParams) -> Result<Completion> {
        self.pop(&params).map(Completion::text_only)
    }

    async fn stream(&self, params: ChatParams) -> Result<TextStream> {
        let text = self.pop(&params)?;

        // Split on char boundaries so consumers exercise real concatenation
        let chars: Vec<char> = text.chars().collect();
        let fragments: Vec<Result<String>> = chars
            .chunks(8.max(chars.len() / 3).max(1))
            .map(|chunk| Ok(chunk.iter().collect()))
            .collect();

        Ok(Box::pin(futures_util::stream::iter(fragments)))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;
    use futures_util::StreamExt;

    fn params(content: &str) -> ChatParams {
        ChatParams {
            model: "scripted".to_string(),
            messages: vec![Message::user(content)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_replays_in_order() {
        let provider = ScriptedProvider::new();
        provider.push_text("first");
        provider.push_text("second");

        assert_eq!(provider.invoke(params("a")).await.unwrap().text, "first");
        assert_eq!(provider.invoke(params("b")).await.unwrap().text, "second");
        assert_eq!(provider.prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let provider = ScriptedProvider::new();
        provider.push_error("connection refused");

        let result = provider.invoke(params("a")).await;
        assert!(matches!(result, Err(ProviderError::Api(m)) if m == "connection refused"));
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let provider = ScriptedProvider::new();
        assert!(provider.invoke(params("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_concatenates_to_original() {
        let provider = ScriptedProvider::new();
        provider.push_text("a longer canned response split into fragments");

        let mut stream = provider.stream(params("a")).await.unwrap();
        let mut collected = String::new();
        let mut fragments = 0;
        while let Some(fragment) = stream.next().await {
            collected.push_str(&fragment.unwrap());
            fragments += 1;
        }

        assert_eq!(collected, "a longer canned response split into fragments");
        assert!(fragments >= 2);
    }
}
