//! Graph driver
//!
//! Owns the request-scoped execution loop: the unconditional
//! translate -> analyze -> plan prefix, then router-driven transitions
//! until a response is generated. Single-threaded per request; each
//! stage's output is the mandatory input to the next routing decision.
//! The driver performs no retries — it trusts each node's own failure
//! containment.

use tracing::{debug, info};
use uuid::Uuid;

use crate::context::ExecutionContext;
use crate::model::ModelHandle;
use crate::nodes;
use crate::router::{route, Route};
use crate::tools::ToolRegistry;
use crate::Result;

/// Default cap on verification-driven plan growth rounds
pub const DEFAULT_MAX_FOLLOWUP_ROUNDS: usize = 3;

/// Runs the task-execution state machine for one request at a time
pub struct GraphDriver {
    model: ModelHandle,
    tools: ToolRegistry,
    max_followup_rounds: usize,
}

impl GraphDriver {
    pub fn new(model: ModelHandle, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            max_followup_rounds: DEFAULT_MAX_FOLLOWUP_ROUNDS,
        }
    }

    /// Cap how many times verification may append follow-up steps
    pub fn with_max_followup_rounds(mut self, rounds: usize) -> Self {
        self.max_followup_rounds = rounds;
        self
    }

    /// Registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Process one user request to a final context.
    ///
    /// The returned context always carries a final assistant message
    /// unless input translation itself failed — the one failure with no
    /// degraded path.
    pub async fn run(&self, input: &str) -> Result<ExecutionContext> {
        let request_id = Uuid::new_v4();
        info!(%request_id, "processing request");

        let mut ctx = ExecutionContext::new(input);

        // Unconditional edges into the graph
        ctx.apply(nodes::translate_input(&ctx, &self.model).await?);
        ctx.apply(nodes::analyze_task(&ctx, &self.model).await);
        ctx.apply(nodes::plan_execution(&ctx, &self.model).await);

        let mut followup_rounds = 0usize;
        loop {
            let next = route(&ctx);
            debug!(%request_id, stage = %next, "transition");
            match next {
                Route::ExecuteStep => {
                    ctx.apply(nodes::execute_step(&ctx, &self.model, &self.tools).await);
                }
                Route::VerifyResult => {
                    let allow_follow_up = followup_rounds < self.max_followup_rounds;
                    let plan_len_before = ctx.plan_len();
                    ctx.apply(nodes::verify_result(&ctx, &self.model, allow_follow_up).await);
                    if ctx.plan_len() > plan_len_before {
                        followup_rounds += 1;
                    }
                }
                Route::HandleError => {
                    ctx.apply(nodes::handle_error(&ctx, &self.model).await);
                    // Unconditional edge: the explanation still gets a
                    // final phrasing pass
                    ctx.apply(nodes::generate_response(&ctx, &self.model).await);
                    break;
                }
                Route::GenerateResponse => {
                    ctx.apply(nodes::generate_response(&ctx, &self.model).await);
                    break;
                }
            }
        }

        info!(
            %request_id,
            status = ?ctx.status,
            steps = ctx.step_results.len(),
            "request finished"
        );
        Ok(ctx)
    }
}
