//! Input translation stage

use opencoder_provider::Message;
use tracing::debug;

use crate::context::{ContextUpdate, ExecutionContext, StageOutcome, Status};
use crate::model::ModelHandle;
use crate::prompts::{render, TRANSLATE_INPUT_PROMPT};

/// Translate a non-English request into English.
///
/// ASCII-only text (letters, digits, punctuation, whitespace) is taken
/// as already English and passes through without a model call. A
/// transport failure here propagates to the caller; every later stage
/// contains its own failures.
pub async fn translate_input(
    ctx: &ExecutionContext,
    model: &ModelHandle,
) -> opencoder_provider::Result<StageOutcome> {
    let input = ctx
        .last_message()
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    if is_english_like(input) {
        debug!("input already english, skipping translation");
        return Ok(StageOutcome::Continue(ContextUpdate {
            status: Some(Status::Running),
            ..Default::default()
        }));
    }

    let prompt = render(TRANSLATE_INPUT_PROMPT, &[("user_request", input)]);
    let raw = model.complete(prompt).await?;
    let translated = clean_translation(&raw);
    debug!("translated input: {}", translated);

    Ok(StageOutcome::Continue(ContextUpdate {
        messages: vec![Message::assistant(translated)],
        status: Some(Status::Running),
        ..Default::default()
    }))
}

/// Non-ASCII letters are the translation trigger; everything typed on a
/// plain keyboard passes.
fn is_english_like(text: &str) -> bool {
    !text.trim().is_empty() && text.chars().all(|c| c.is_ascii())
}

/// Deterministic cleanup of translator output: marker lines, label
/// prefixes and quote wrapping that models habitually add.
fn clean_translation(raw: &str) -> String {
    let mut text = raw.trim();

    for marker in ["---message start---", "---message end---"] {
        text = text
            .trim_start_matches(marker)
            .trim_end_matches(marker)
            .trim();
    }

    for label in ["Translation:", "Translated text:", "English:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim();
        }
    }

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_like_detection() {
        assert!(is_english_like("create a file named x.txt with 'hi'"));
        assert!(is_english_like("what is a closure?"));
        assert!(!is_english_like("파일을 만들어 주세요"));
        assert!(!is_english_like("crée un fichier s'il te plaît é"));
        assert!(!is_english_like("   "));
    }

    #[test]
    fn test_clean_translation_markers() {
        let raw = "---message start---\nCreate a file\n---message end---";
        assert_eq!(clean_translation(raw), "Create a file");
    }

    #[test]
    fn test_clean_translation_label_and_quotes() {
        assert_eq!(
            clean_translation("Translation: \"Create a file\""),
            "Create a file"
        );
    }

    #[test]
    fn test_clean_translation_plain_passthrough() {
        assert_eq!(clean_translation("Create a file"), "Create a file");
    }
}
