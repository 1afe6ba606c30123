//! State machine transition function
//!
//! Pure function of the execution context; the driver calls it after
//! every conditional stage. First matching rule wins:
//!
//! 1. error status          -> handle_error
//! 2. steps remaining       -> execute_step
//! 3. completed, unverified -> verify_result (tool runs only; a direct
//!    response has no results to verify)
//! 4. verified (either way) -> generate_response
//! 5. default               -> generate_response

use tracing::debug;

use crate::context::{ExecutionContext, Status};

/// Stages the router can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ExecuteStep,
    VerifyResult,
    GenerateResponse,
    HandleError,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Route::ExecuteStep => "execute_step",
            Route::VerifyResult => "verify_result",
            Route::GenerateResponse => "generate_response",
            Route::HandleError => "handle_error",
        };
        f.write_str(name)
    }
}

/// Pick the next stage for this context
pub fn route(ctx: &ExecutionContext) -> Route {
    if ctx.status == Status::Error {
        debug!("route: error status -> handle_error");
        return Route::HandleError;
    }

    if let (Some(_), Some(index), Some(total)) =
        (ctx.execution_plan.as_ref(), ctx.step_index, ctx.total_steps)
    {
        if index < total {
            debug!("route: step {index}/{total} -> execute_step");
            return Route::ExecuteStep;
        }
    }

    if ctx.status == Status::Completed && ctx.verified.is_none() && !ctx.direct_response {
        debug!("route: completed and unverified -> verify_result");
        return Route::VerifyResult;
    }

    debug!("route: -> generate_response");
    Route::GenerateResponse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ExecutionPlan, PlanStep};
    use serde_json::Value;

    fn ctx_with_plan(executed: usize, total: usize) -> ExecutionContext {
        let mut ctx = ExecutionContext::new("x");
        ctx.execution_plan = Some(ExecutionPlan {
            plan: (0..total)
                .map(|i| PlanStep {
                    step_id: (i + 1).to_string(),
                    action: "a".to_string(),
                    tool: None,
                    tool_inputs: Value::Null,
                    validation: None,
                })
                .collect(),
        });
        ctx.step_index = Some(executed);
        ctx.total_steps = Some(total);
        ctx.status = Status::Running;
        ctx
    }

    #[test]
    fn test_error_wins_over_everything() {
        let mut ctx = ctx_with_plan(0, 2);
        ctx.status = Status::Error;
        ctx.verified = Some(true);
        assert_eq!(route(&ctx), Route::HandleError);
    }

    #[test]
    fn test_remaining_steps_route_to_execute() {
        let ctx = ctx_with_plan(1, 3);
        assert_eq!(route(&ctx), Route::ExecuteStep);
    }

    #[test]
    fn test_exhausted_plan_routes_to_verify() {
        let mut ctx = ctx_with_plan(2, 2);
        ctx.status = Status::Completed;
        assert_eq!(route(&ctx), Route::VerifyResult);
    }

    #[test]
    fn test_direct_response_skips_verification() {
        let mut ctx = ExecutionContext::new("x");
        ctx.status = Status::Completed;
        ctx.direct_response = true;
        assert_eq!(route(&ctx), Route::GenerateResponse);
    }

    #[test]
    fn test_verified_routes_to_response_either_way() {
        for verdict in [true, false] {
            let mut ctx = ctx_with_plan(2, 2);
            ctx.status = Status::Completed;
            ctx.verified = Some(verdict);
            assert_eq!(route(&ctx), Route::GenerateResponse);
        }
    }

    #[test]
    fn test_default_routes_to_response() {
        let mut ctx = ExecutionContext::new("x");
        ctx.status = Status::Running;
        assert_eq!(route(&ctx), Route::GenerateResponse);
    }

    #[test]
    fn test_route_is_pure() {
        let ctx = ctx_with_plan(0, 1);
        assert_eq!(route(&ctx), route(&ctx));
    }

    #[test]
    fn test_missing_cursor_never_executes() {
        let mut ctx = ctx_with_plan(0, 2);
        ctx.step_index = None;
        assert_ne!(route(&ctx), Route::ExecuteStep);
    }
}
