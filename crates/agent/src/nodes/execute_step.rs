//! Step execution stage

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorInfo, ErrorKind, ExecutionContext, StageOutcome, Status, StepResult,
    ToolOutcome,
};
use crate::extract::extract_json;
use crate::model::ModelHandle;
use crate::prompts::{render, EXECUTE_STEP_PROMPT};
use crate::tools::{normalize_tool_input, ToolError, ToolRegistry};

/// Run the current plan step.
///
/// The model is shown the step and the tool catalog and asked for a
/// `{tool, input}` call. No call at all is a legitimate answer (the step
/// completes without tools); a call naming an unknown tool or a tool
/// that fails is captured as a failed step result and the run continues.
/// Steps execute strictly in plan order.
pub async fn execute_step(
    ctx: &ExecutionContext,
    model: &ModelHandle,
    tools: &ToolRegistry,
) -> StageOutcome {
    let (Some(plan), Some(index), Some(total)) =
        (ctx.execution_plan.as_ref(), ctx.step_index, ctx.total_steps)
    else {
        return StageOutcome::Fail(ErrorInfo::new(ErrorKind::MissingStep, "no step to execute"));
    };
    if index >= total || index >= plan.plan.len() {
        return StageOutcome::Fail(ErrorInfo::new(ErrorKind::MissingStep, "no step to execute"));
    }

    let step = &plan.plan[index];
    debug!("executing step {}/{}: {}", index + 1, total, step.action);

    let step_json = match serde_json::to_string_pretty(step) {
        Ok(json) => json,
        Err(e) => {
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::Parse,
                format!("plan step not serializable: {e}"),
            ))
        }
    };
    let catalog_json = match serde_json::to_string_pretty(&tools.catalog()) {
        Ok(json) => json,
        Err(e) => {
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::Parse,
                format!("tool catalog not serializable: {e}"),
            ))
        }
    };

    let prompt = render(
        EXECUTE_STEP_PROMPT,
        &[
            ("current_step", step_json.as_str()),
            ("available_tools", catalog_json.as_str()),
        ],
    );
    let raw = match model.complete(prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("step execution model call failed: {e}");
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::ModelInvocation,
                format!("step execution model call failed: {e}"),
            ));
        }
    };

    let next_index = index + 1;
    let next_status = if next_index >= total {
        Status::Completed
    } else {
        Status::Running
    };

    // No JSON in the response means the model chose to finish the step
    // without a tool
    let Ok(call) = extract_json(&raw) else {
        debug!("step {} completed without tool call", step.step_id);
        return StageOutcome::Continue(ContextUpdate {
            step_results: vec![StepResult {
                step_id: step.step_id.clone(),
                tool: None,
                input: None,
                outcome: ToolOutcome::ok(json!({ "message": "completed without tool call" })),
            }],
            step_index: Some(next_index),
            status: Some(next_status),
            ..Default::default()
        });
    };

    let tool_name = match call.get("tool").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return StageOutcome::Fail(
                ErrorInfo::new(ErrorKind::Parse, "tool call is missing a tool name")
                    .with_trace(raw),
            )
        }
    };
    let input = call.get("input").cloned().unwrap_or_else(|| json!({}));
    let input = normalize_tool_input(&tool_name, input);

    let outcome = match tools.execute(&tool_name, input.clone()).await {
        Ok(outcome) => outcome,
        Err(ToolError::NotFound { name, available }) => {
            warn!("step {} requested unknown tool '{}'", step.step_id, name);
            ToolOutcome::fail(format!(
                "tool '{}' not found; available tools: {}",
                name,
                available.join(", ")
            ))
        }
    };

    if !outcome.success {
        debug!(
            "step {} tool '{}' failed: {}",
            step.step_id,
            tool_name,
            outcome.error.as_deref().unwrap_or("unknown")
        );
    }

    StageOutcome::Continue(ContextUpdate {
        step_results: vec![StepResult {
            step_id: step.step_id.clone(),
            tool: Some(tool_name),
            input: Some(input),
            outcome,
        }],
        step_index: Some(next_index),
        status: Some(next_status),
        ..Default::default()
    })
}
