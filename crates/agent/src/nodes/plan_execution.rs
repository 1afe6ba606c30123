//! Planning stage

use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorInfo, ErrorKind, ExecutionContext, ExecutionPlan, StageOutcome, Status,
    TaskType,
};
use crate::extract::extract_typed;
use crate::model::ModelHandle;
use crate::prompts::{render, PLANNING_PROMPT};

/// Sentinel tool name a plan can use to mean "no tools needed"
const DIRECT_RESPONSE_TOOL: &str = "direct_response";

/// Turn the task analysis into an ordered step plan.
///
/// Simple responses bypass planning entirely: the answer comes from the
/// model's own knowledge, with no tool execution and no verification.
pub async fn plan_execution(ctx: &ExecutionContext, model: &ModelHandle) -> StageOutcome {
    let Some(analysis) = ctx.current_task.as_ref() else {
        return StageOutcome::Fail(ErrorInfo::new(
            ErrorKind::MissingTaskAnalysis,
            "no task analysis result available",
        ));
    };

    if analysis.task_type == TaskType::SimpleResponse || analysis.subtasks.is_empty() {
        debug!("task needs only a direct response, skipping plan");
        return StageOutcome::Continue(ContextUpdate {
            direct_response: Some(true),
            status: Some(Status::Completed),
            ..Default::default()
        });
    }

    let analysis_json = match serde_json::to_string_pretty(analysis) {
        Ok(json) => json,
        Err(e) => {
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::Parse,
                format!("task analysis not serializable: {e}"),
            ))
        }
    };

    let prompt = render(PLANNING_PROMPT, &[("task_analysis", &analysis_json)]);
    let raw = match model.complete_streaming(prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("planning model call failed: {e}");
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::ModelInvocation,
                format!("planning model call failed: {e}"),
            ));
        }
    };

    let plan = match extract_typed::<ExecutionPlan>(&raw) {
        Ok(plan) => plan,
        Err(e) => {
            return StageOutcome::Fail(
                ErrorInfo::new(ErrorKind::Parse, "unable to parse execution plan")
                    .with_trace(e.raw().to_string()),
            )
        }
    };

    let only_direct = plan.plan.len() == 1
        && plan.plan[0].tool.as_deref() == Some(DIRECT_RESPONSE_TOOL);
    if plan.plan.is_empty() || only_direct {
        debug!("plan indicates direct response without tool execution");
        return StageOutcome::Continue(ContextUpdate {
            direct_response: Some(true),
            status: Some(Status::Completed),
            ..Default::default()
        });
    }

    debug!("execution plan created with {} steps", plan.plan.len());
    let total = plan.plan.len();
    StageOutcome::Continue(ContextUpdate {
        execution_plan: Some(plan),
        total_steps: Some(total),
        step_index: Some(0),
        status: Some(Status::Running),
        ..Default::default()
    })
}
