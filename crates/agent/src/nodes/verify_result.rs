//! Result verification stage

use tracing::{debug, warn};

use crate::context::{
    ContextUpdate, ErrorInfo, ErrorKind, ExecutionContext, StageOutcome, Status,
    VerificationReport,
};
use crate::extract::extract_typed;
use crate::model::ModelHandle;
use crate::prompts::{render, VERIFY_RESULT_PROMPT};

/// Check the accumulated step results against the plan.
///
/// The report may request additional steps; while `allow_follow_up`
/// holds they are appended to the plan (never replacing existing steps)
/// and the execute/verify loop re-enters. The driver withdraws the
/// allowance after a bounded number of growth rounds so a model that
/// keeps inventing work cannot loop forever.
pub async fn verify_result(
    ctx: &ExecutionContext,
    model: &ModelHandle,
    allow_follow_up: bool,
) -> StageOutcome {
    let Some(plan) = ctx.execution_plan.as_ref() else {
        return StageOutcome::Fail(ErrorInfo::new(
            ErrorKind::MissingResults,
            "no execution results to verify",
        ));
    };

    let results_json = match serde_json::to_string_pretty(&ctx.step_results) {
        Ok(json) => json,
        Err(e) => {
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::Parse,
                format!("step results not serializable: {e}"),
            ))
        }
    };
    let plan_json = match serde_json::to_string_pretty(plan) {
        Ok(json) => json,
        Err(e) => {
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::Parse,
                format!("plan not serializable: {e}"),
            ))
        }
    };

    let prompt = render(
        VERIFY_RESULT_PROMPT,
        &[
            ("execution_results", results_json.as_str()),
            ("original_plan", plan_json.as_str()),
        ],
    );
    let raw = match model.complete(prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("verification model call failed: {e}");
            return StageOutcome::Fail(ErrorInfo::new(
                ErrorKind::ModelInvocation,
                format!("verification model call failed: {e}"),
            ));
        }
    };

    let report = match extract_typed::<VerificationReport>(&raw) {
        Ok(report) => report,
        Err(e) => {
            return StageOutcome::Fail(
                ErrorInfo::new(ErrorKind::Parse, "unable to parse verification result")
                    .with_trace(e.raw().to_string()),
            )
        }
    };

    if !report.additional_steps.is_empty() {
        if allow_follow_up {
            debug!(
                "verification appended {} follow-up steps",
                report.additional_steps.len()
            );
            let mut grown = plan.clone();
            grown.plan.extend(report.additional_steps.iter().cloned());
            let total = grown.plan.len();

            return StageOutcome::Continue(ContextUpdate {
                execution_plan: Some(grown),
                total_steps: Some(total),
                verification: Some(report),
                requires_follow_up: Some(true),
                status: Some(Status::Running),
                ..Default::default()
            });
        }
        warn!(
            "verification requested {} additional steps but the follow-up budget is exhausted",
            report.additional_steps.len()
        );
    }

    let status = if report.success {
        Status::Completed
    } else {
        Status::Error
    };
    debug!("verification verdict: success={}", report.success);

    StageOutcome::Continue(ContextUpdate {
        verified: Some(report.success),
        verification: Some(report),
        status: Some(status),
        ..Default::default()
    })
}
