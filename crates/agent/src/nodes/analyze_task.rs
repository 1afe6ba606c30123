//! Task analysis stage

use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorInfo, ErrorKind, ExecutionContext, StageOutcome, Status, TaskAnalysis,
};
use crate::extract::extract_typed;
use crate::model::ModelHandle;
use crate::prompts::{render, TASK_ANALYSIS_PROMPT};

/// Classify the request and break it into subtasks.
///
/// Reads the last transcript message, which is the translated request
/// when translation ran and the raw input otherwise.
pub async fn analyze_task(ctx: &ExecutionContext, model: &ModelHandle) -> StageOutcome {
    let request = ctx
        .last_message()
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    let prompt = render(TASK_ANALYSIS_PROMPT, &[("user_request", request)]);
    let raw = match model.complete(prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("task analysis model call failed: {e}");
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::ModelInvocation,
                format!("task analysis model call failed: {e}"),
            ));
        }
    };

    match extract_typed::<TaskAnalysis>(&raw) {
        Ok(analysis) => {
            debug!(
                "analysis: {:?}, {} subtasks",
                analysis.task_type,
                analysis.subtasks.len()
            );
            StageOutcome::Continue(ContextUpdate {
                current_task: Some(analysis),
                status: Some(Status::Running),
                ..Default::default()
            })
        }
        Err(e) => StageOutcome::Fail(
            ErrorInfo::new(ErrorKind::Parse, "unable to parse task analysis result")
                .with_trace(e.raw().to_string()),
        ),
    }
}
