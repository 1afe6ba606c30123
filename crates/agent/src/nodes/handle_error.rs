//! Error handling stage

use opencoder_provider::Message;
use serde_json::json;
use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorReport, ExecutionContext, StageOutcome, Status,
};
use crate::extract::extract_typed;
use crate::model::ModelHandle;
use crate::prompts::{render, HANDLE_ERROR_PROMPT};

/// Explain a captured failure to the user.
///
/// Last line of defense: nothing that happens here may fail the run.
/// If the model's explanation doesn't parse, a report is assembled from
/// the recorded error itself with the raw model text as the user
/// message; if the model call fails too, the report is built entirely
/// from the recorded error.
pub async fn handle_error(ctx: &ExecutionContext, model: &ModelHandle) -> StageOutcome {
    let Some(last_error) = ctx.last_error.as_ref() else {
        // Nothing to explain
        debug!("error stage entered without a recorded error");
        return StageOutcome::Continue(ContextUpdate {
            status: Some(Status::Error),
            ..Default::default()
        });
    };

    let error_json =
        serde_json::to_string_pretty(last_error).unwrap_or_else(|_| last_error.message.clone());
    let snapshot = json!({
        "currentTask": ctx.current_task,
        "currentStepIndex": ctx.step_index,
        "totalSteps": ctx.total_steps,
    });
    let snapshot_json =
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string());

    let prompt = render(
        HANDLE_ERROR_PROMPT,
        &[
            ("error_info", error_json.as_str()),
            ("context", snapshot_json.as_str()),
        ],
    );

    let report = match model.complete(prompt).await {
        Ok(raw) => extract_typed::<ErrorReport>(&raw).unwrap_or_else(|_| ErrorReport {
            error_type: last_error.kind.to_string(),
            cause: last_error.message.clone(),
            resolution: "Unable to resolve error.".to_string(),
            user_message: raw,
        }),
        Err(e) => {
            warn!("error handling model call failed: {e}");
            ErrorReport {
                error_type: last_error.kind.to_string(),
                cause: last_error.message.clone(),
                resolution: "Unable to resolve error.".to_string(),
                user_message: format!("Something went wrong: {}", last_error.message),
            }
        }
    };

    StageOutcome::Continue(ContextUpdate {
        messages: vec![Message::assistant(report.user_message.clone())],
        error_report: Some(report),
        status: Some(Status::Error),
        ..Default::default()
    })
}
