//! Response generation stage

use opencoder_provider::Message;
use serde_json::json;
use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorInfo, ErrorKind, ExecutionContext, StageOutcome, Status,
};
use crate::model::ModelHandle;
use crate::prompts::{render, DIRECT_RESPONSE_PROMPT, GENERATE_RESPONSE_PROMPT};

/// Produce the final user-visible answer.
///
/// Two mutually exclusive template paths: a direct response answers from
/// the model's own knowledge; the standard path summarizes the step
/// results and the verification report. This is a terminal stage: its
/// own failure does not route back into error handling.
pub async fn generate_response(ctx: &ExecutionContext, model: &ModelHandle) -> StageOutcome {
    let request = ctx.original_request().to_string();

    let (path, prompt) = if ctx.direct_response {
        let analysis_json = ctx
            .current_task
            .as_ref()
            .and_then(|t| serde_json::to_string_pretty(t).ok())
            .unwrap_or_else(|| "{}".to_string());
        (
            "direct",
            render(
                DIRECT_RESPONSE_PROMPT,
                &[
                    ("original_request", request.as_str()),
                    ("task_analysis", analysis_json.as_str()),
                ],
            ),
        )
    } else {
        let results_json = serde_json::to_string_pretty(&ctx.step_results)
            .unwrap_or_else(|_| "[]".to_string());
        let report_json = ctx
            .verification
            .as_ref()
            .and_then(|r| serde_json::to_string_pretty(r).ok())
            .unwrap_or_else(|| json!({}).to_string());
        (
            "standard",
            render(
                GENERATE_RESPONSE_PROMPT,
                &[
                    ("original_request", request.as_str()),
                    ("execution_results", results_json.as_str()),
                    ("verification_report", report_json.as_str()),
                ],
            ),
        )
    };

    debug!("generating {} response", path);
    match model.complete_streaming(prompt).await {
        Ok(text) => StageOutcome::Continue(ContextUpdate {
            messages: vec![Message::assistant(text)],
            status: Some(Status::Completed),
            ..Default::default()
        }),
        Err(e) => {
            warn!("{} response generation failed: {e}", path);
            StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::ResponseGeneration,
                format!("unable to generate {path} response: {e}"),
            ))
        }
    }
}
