//! Tool-input normalization
//!
//! Models paraphrase the translate tool's input shape often enough that
//! step execution routes its calls through this narrowly-scoped shim
//! before dispatch. New tools get no such treatment; add an adapter here
//! only when observed model output demands one.

use serde_json::Value;

/// Reconcile a model-emitted tool input with the tool's declared schema
pub fn normalize_tool_input(tool: &str, input: Value) -> Value {
    match tool {
        "translate_text" => normalize_translate_input(input),
        _ => input,
    }
}

fn normalize_translate_input(input: Value) -> Value {
    let Value::Object(mut fields) = input else {
        return input;
    };

    // input_text -> text
    if !fields.contains_key("text") {
        if let Some(value) = fields.remove("input_text") {
            fields.insert("text".to_string(), value);
        }
    }

    // target_language -> targetLanguage
    if !fields.contains_key("targetLanguage") {
        if let Some(value) = fields.remove("target_language") {
            fields.insert("targetLanguage".to_string(), value);
        }
    }

    // strip a single layer of wrapping quotes from the text
    let unquoted = match fields.get("text") {
        Some(Value::String(text)) => {
            let stripped = strip_wrapping_quotes(text);
            (stripped != text.as_str()).then(|| stripped.to_string())
        }
        _ => None,
    };
    if let Some(text) = unquoted {
        fields.insert("text".to_string(), Value::String(text));
    }

    Value::Object(fields)
}

fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renames_input_text() {
        let normalized = normalize_tool_input("translate_text", json!({ "input_text": "hi" }));
        assert_eq!(normalized["text"], "hi");
        assert!(normalized.get("input_text").is_none());
    }

    #[test]
    fn test_renames_target_language() {
        let normalized = normalize_tool_input(
            "translate_text",
            json!({ "text": "hi", "target_language": "ko" }),
        );
        assert_eq!(normalized["targetLanguage"], "ko");
        assert!(normalized.get("target_language").is_none());
    }

    #[test]
    fn test_strips_one_quote_layer() {
        let normalized =
            normalize_tool_input("translate_text", json!({ "text": "\"'quoted'\"" }));
        // exactly one layer comes off
        assert_eq!(normalized["text"], "'quoted'");
    }

    #[test]
    fn test_existing_fields_not_clobbered() {
        let normalized = normalize_tool_input(
            "translate_text",
            json!({ "text": "keep", "input_text": "drop", "targetLanguage": "en", "target_language": "ko" }),
        );
        assert_eq!(normalized["text"], "keep");
        assert_eq!(normalized["targetLanguage"], "en");
    }

    #[test]
    fn test_other_tools_pass_through() {
        let input = json!({ "input_text": "hi" });
        let normalized = normalize_tool_input("read_file", input.clone());
        assert_eq!(normalized, input);
    }

    #[test]
    fn test_non_object_input_untouched() {
        let normalized = normalize_tool_input("translate_text", json!("just a string"));
        assert_eq!(normalized, json!("just a string"));
    }
}
