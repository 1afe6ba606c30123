//! Text translation tool
//!
//! Provider-backed translation between English and Korean with source
//! auto-detection. Input field names are camelCase; model output that
//! uses other spellings is reconciled by [`super::normalize`] before it
//! reaches this tool.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use opencoder_provider::{ChatParams, Message, Provider};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::ToolTrait;
use crate::context::ToolOutcome;

static HANGUL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{1100}-\u{11FF}\u{3130}-\u{318F}\u{AC00}-\u{D7A3}]").expect("static regex"));

fn language_name(code: &str) -> &'static str {
    if code == "ko" {
        "Korean"
    } else {
        "English"
    }
}

fn detect_language(text: &str) -> &'static str {
    if HANGUL.is_match(text) {
        "ko"
    } else {
        "en"
    }
}

/// Translate text via the configured model provider
pub struct TranslateTextTool {
    provider: Arc<dyn Provider>,
    model: String,
}

impl TranslateTextTool {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn translation_prompt(text: &str, source: &str, target: &str) -> String {
        format!(
            "You are a professional translator specializing in {} to {} translation.\n\
             Translate the following text from {} to {}.\n\
             Provide only the translation without explanations or comments.\n\n\
             Text to translate: \"{}\"\n\n\
             Translation:",
            language_name(source),
            language_name(target),
            language_name(source),
            language_name(target),
            text
        )
    }
}

#[derive(Deserialize)]
struct TranslateTextArgs {
    text: String,
    #[serde(rename = "targetLanguage", default = "default_target")]
    target_language: String,
    #[serde(rename = "sourceLanguage", default = "default_source")]
    source_language: String,
}

fn default_target() -> String {
    "en".to_string()
}

fn default_source() -> String {
    "auto".to_string()
}

#[async_trait]
impl ToolTrait for TranslateTextTool {
    fn name(&self) -> &str {
        "translate_text"
    }
    fn description(&self) -> &str {
        "Translate text between English and Korean. Detects the source language when not given."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to translate" },
                "targetLanguage": { "type": "string", "enum": ["en", "ko"], "description": "Target language code" },
                "sourceLanguage": { "type": "string", "enum": ["en", "ko", "auto"], "description": "Source language code" }
            },
            "required": ["text"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: TranslateTextArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };

        if !matches!(args.target_language.as_str(), "en" | "ko") {
            return ToolOutcome::fail(format!(
                "unsupported target language '{}'",
                args.target_language
            ));
        }

        let source = if args.source_language == "auto" {
            detect_language(&args.text)
        } else {
            match args.source_language.as_str() {
                "en" | "ko" => args.source_language.as_str(),
                other => return ToolOutcome::fail(format!("unsupported source language '{other}'")),
            }
        };

        if source == args.target_language {
            return ToolOutcome::ok(json!({
                "source_language": source,
                "target_language": args.target_language,
                "original_text": args.text,
                "translated_text": args.text,
                "message": "text is already in the target language",
            }));
        }

        if !self.provider.is_configured() {
            return ToolOutcome::fail("translation provider is not configured");
        }

        debug!("translating {} -> {}", source, args.target_language);
        let prompt = Self::translation_prompt(&args.text, source, &args.target_language);
        let params = ChatParams {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: 0.3,
            ..Default::default()
        };

        match self.provider.invoke(params).await {
            Ok(completion) => ToolOutcome::ok(json!({
                "source_language": source,
                "target_language": args.target_language,
                "original_text": args.text,
                "translated_text": completion.text.trim(),
            })),
            Err(e) => ToolOutcome::fail(format!("translation failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencoder_provider::ScriptedProvider;

    fn tool(provider: ScriptedProvider) -> TranslateTextTool {
        TranslateTextTool::new(Arc::new(provider), "scripted".to_string())
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("hello there"), "en");
        assert_eq!(detect_language("안녕하세요"), "ko");
    }

    #[tokio::test]
    async fn test_same_language_is_identity() {
        let t = tool(ScriptedProvider::new());
        let outcome = t
            .execute(json!({ "text": "hello", "targetLanguage": "en" }))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.payload["translated_text"], "hello");
    }

    #[tokio::test]
    async fn test_translates_via_provider() {
        let provider = ScriptedProvider::new();
        provider.push_text("안녕하세요");
        let t = tool(provider);

        let outcome = t
            .execute(json!({ "text": "hello", "targetLanguage": "ko" }))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.payload["source_language"], "en");
        assert_eq!(outcome.payload["translated_text"], "안녕하세요");
    }

    #[tokio::test]
    async fn test_unsupported_target_rejected() {
        let t = tool(ScriptedProvider::new());
        let outcome = t
            .execute(json!({ "text": "hello", "targetLanguage": "fr" }))
            .await;

        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_provider_failure_is_contained() {
        let provider = ScriptedProvider::new();
        provider.push_error("connection refused");
        let t = tool(provider);

        let outcome = t
            .execute(json!({ "text": "hello", "targetLanguage": "ko" }))
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("translation failed"));
    }
}
