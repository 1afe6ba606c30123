//! Tests for the Provider trait surface
//!
//! Exercises the trait as consumers see it: through a trait object,
//! including the default stream fallback for backends without native
//! streaming.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use opencoder_provider::{
    ChatParams, Completion, Message, Provider, Result, ScriptedProvider,
};

/// Backend that only implements invoke; stream comes from the default
struct InvokeOnlyProvider;

#[async_trait]
impl Provider for InvokeOnlyProvider {
    async fn invoke(&self, _params: ChatParams) -> Result<Completion> {
        Ok(Completion::text_only("whole answer"))
    }
    fn name(&self) -> &str {
        "invoke-only"
    }
    fn default_model(&self) -> String {
        "invoke-only".to_string()
    }
    fn is_configured(&self) -> bool {
        true
    }
}

fn params() -> ChatParams {
    ChatParams {
        model: "m".to_string(),
        messages: vec![Message::user("hello")],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_default_stream_yields_single_fragment() {
    let provider = InvokeOnlyProvider;
    let mut stream = provider.stream(params()).await.unwrap();

    let mut fragments = Vec::new();
    while let Some(fragment) = stream.next().await {
        fragments.push(fragment.unwrap());
    }

    assert_eq!(fragments, vec!["whole answer".to_string()]);
}

#[tokio::test]
async fn test_provider_as_trait_object() {
    let scripted = ScriptedProvider::new();
    scripted.push_text("from behind the trait");
    let provider: Arc<dyn Provider> = Arc::new(scripted);

    let completion = provider.invoke(params()).await.unwrap();
    assert_eq!(completion.text, "from behind the trait");
    assert_eq!(provider.name(), "scripted");
}

#[tokio::test]
async fn test_stream_collects_to_invoke_result() {
    let scripted = ScriptedProvider::new();
    scripted.push_text("the same text either way, long enough to fragment");
    let provider: Arc<dyn Provider> = Arc::new(scripted);

    let mut stream = provider.stream(params()).await.unwrap();
    let mut collected = String::new();
    while let Some(fragment) = stream.next().await {
        collected.push_str(&fragment.unwrap());
    }

    assert_eq!(collected, "the same text either way, long enough to fragment");
}
