//! Request-scoped execution state
//!
//! One [`ExecutionContext`] is created per user request, threaded through
//! every stage node and discarded once the final response is emitted.
//! Stage nodes never mutate the context directly: they return a
//! [`StageOutcome`] and [`ExecutionContext::apply`] performs the merge,
//! so the merge rules live in exactly one place. Transcript and step
//! results are append-only; the plan may grow but never shrink.

use chrono::{DateTime, Utc};
use opencoder_provider::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request lifecycle flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Running,
    Completed,
    Error,
}

/// What went wrong, as data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ParseError")]
    Parse,
    #[serde(rename = "MissingTaskAnalysis")]
    MissingTaskAnalysis,
    #[serde(rename = "MissingStep")]
    MissingStep,
    #[serde(rename = "MissingResults")]
    MissingResults,
    #[serde(rename = "ToolNotFound")]
    ToolNotFound,
    #[serde(rename = "ToolExecutionError")]
    ToolExecution,
    #[serde(rename = "ResponseGenerationError")]
    ResponseGeneration,
    #[serde(rename = "ModelInvocationError")]
    ModelInvocation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::MissingTaskAnalysis => "MissingTaskAnalysis",
            ErrorKind::MissingStep => "MissingStep",
            ErrorKind::MissingResults => "MissingResults",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolExecution => "ToolExecutionError",
            ErrorKind::ResponseGeneration => "ResponseGenerationError",
            ErrorKind::ModelInvocation => "ModelInvocationError",
        };
        f.write_str(name)
    }
}

/// A captured failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Utc::now(),
            trace: None,
        }
    }

    /// Attach the raw model output that produced the failure
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// Task category assigned by the analysis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SimpleResponse,
    CodeCreation,
    CodeModification,
    CodeAnalysis,
    EnvironmentSetup,
    #[serde(other)]
    Other,
}

/// One unit of work inside a task analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub potential_tools: Vec<String>,
    // Advisory only; steps always run in plan order
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Output of the analysis stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_type: TaskType,
    #[serde(default)]
    pub requires_tools: bool,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// One planned step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub action: String,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub tool_inputs: Value,
    #[serde(default)]
    pub validation: Option<String>,
}

/// Ordered list of steps; appended to, never reordered or truncated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    #[serde(default)]
    pub plan: Vec<PlanStep>,
}

/// Result of running (or failing to run) one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default)]
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Record of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    pub outcome: ToolOutcome,
}

/// One problem found by verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationIssue {
    #[serde(default)]
    pub step_id: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Output of the verification stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<VerificationIssue>,
    #[serde(default)]
    pub additional_steps: Vec<PlanStep>,
}

/// Output of the error-handling stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub user_message: String,
}

/// The single state object threaded through every stage
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Conversation transcript; append-only within a request
    pub messages: Vec<Message>,
    pub status: Status,
    /// Set once by the analysis stage, read-only after
    pub current_task: Option<TaskAnalysis>,
    pub execution_plan: Option<ExecutionPlan>,
    /// 0 <= step_index <= total_steps; advances by one per executed step
    pub step_index: Option<usize>,
    pub total_steps: Option<usize>,
    pub step_results: Vec<StepResult>,
    /// Overwritten, never cleared
    pub last_error: Option<ErrorInfo>,
    pub verification: Option<VerificationReport>,
    /// Set only by the verification stage
    pub verified: Option<bool>,
    pub error_report: Option<ErrorReport>,
    /// true bypasses planning and tool execution entirely
    pub direct_response: bool,
    pub requires_follow_up: bool,
}

impl ExecutionContext {
    /// Fresh context for one user request
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(input)],
            status: Status::Idle,
            current_task: None,
            execution_plan: None,
            step_index: None,
            total_steps: None,
            step_results: Vec::new(),
            last_error: None,
            verification: None,
            verified: None,
            error_report: None,
            direct_response: false,
            requires_follow_up: false,
        }
    }

    /// Most recent transcript message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The request that started this context
    pub fn original_request(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Current plan length
    pub fn plan_len(&self) -> usize {
        self.execution_plan
            .as_ref()
            .map(|p| p.plan.len())
            .unwrap_or(0)
    }

    /// The user-visible answer, once one exists
    pub fn final_answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "assistant")
            .map(|m| m.content.as_str())
    }

    /// Merge a stage outcome into this context.
    ///
    /// Rules: transcript and step results are appended; a new plan must
    /// contain the old one as a prefix (appended steps only); `Some`
    /// fields overwrite; a failure outcome sets status and last_error
    /// and touches nothing else.
    pub fn apply(&mut self, outcome: StageOutcome) {
        match outcome {
            StageOutcome::Fail(info) => {
                self.status = Status::Error;
                self.last_error = Some(info);
            }
            StageOutcome::Continue(update) => {
                self.messages.extend(update.messages);
                self.step_results.extend(update.step_results);
                if let Some(status) = update.status {
                    self.status = status;
                }
                if let Some(task) = update.current_task {
                    self.current_task = Some(task);
                }
                if let Some(plan) = update.execution_plan {
                    debug_assert!(plan.plan.len() >= self.plan_len());
                    self.execution_plan = Some(plan);
                }
                if let Some(index) = update.step_index {
                    self.step_index = Some(index);
                }
                if let Some(total) = update.total_steps {
                    self.total_steps = Some(total);
                }
                if let Some(report) = update.verification {
                    self.verification = Some(report);
                }
                if let Some(verified) = update.verified {
                    self.verified = Some(verified);
                }
                if let Some(report) = update.error_report {
                    self.error_report = Some(report);
                }
                if let Some(direct) = update.direct_response {
                    self.direct_response = direct;
                }
                if let Some(follow_up) = update.requires_follow_up {
                    self.requires_follow_up = follow_up;
                }
            }
        }
    }
}

/// Partial context produced by a stage node
#[derive(Debug, Default)]
pub struct ContextUpdate {
    pub messages: Vec<Message>,
    pub status: Option<Status>,
    pub current_task: Option<TaskAnalysis>,
    pub execution_plan: Option<ExecutionPlan>,
    pub step_index: Option<usize>,
    pub total_steps: Option<usize>,
    pub step_results: Vec<StepResult>,
    pub verification: Option<VerificationReport>,
    pub verified: Option<bool>,
    pub error_report: Option<ErrorReport>,
    pub direct_response: Option<bool>,
    pub requires_follow_up: Option<bool>,
}

/// What a stage node hands back to the driver
#[derive(Debug)]
pub enum StageOutcome {
    /// Merge these fields and keep going
    Continue(ContextUpdate),
    /// Expected failure: record it and let the router divert to error handling
    Fail(ErrorInfo),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(id: &str) -> PlanStep {
        PlanStep {
            step_id: id.to_string(),
            action: format!("step {id}"),
            tool: None,
            tool_inputs: Value::Null,
            validation: None,
        }
    }

    #[test]
    fn test_new_context_is_idle() {
        let ctx = ExecutionContext::new("hello");
        assert_eq!(ctx.status, Status::Idle);
        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.original_request(), "hello");
        assert!(ctx.final_answer().is_none());
    }

    #[test]
    fn test_apply_appends_messages() {
        let mut ctx = ExecutionContext::new("hello");
        ctx.apply(StageOutcome::Continue(ContextUpdate {
            messages: vec![Message::assistant("hi")],
            status: Some(Status::Running),
            ..Default::default()
        }));

        assert_eq!(ctx.messages.len(), 2);
        assert_eq!(ctx.status, Status::Running);
        assert_eq!(ctx.final_answer(), Some("hi"));

        // transcript is append-only: a second update never replaces it
        ctx.apply(StageOutcome::Continue(ContextUpdate {
            messages: vec![Message::assistant("again")],
            ..Default::default()
        }));
        assert_eq!(ctx.messages.len(), 3);
        assert_eq!(ctx.messages[1].content, "hi");
    }

    #[test]
    fn test_apply_appends_step_results() {
        let mut ctx = ExecutionContext::new("x");
        for id in ["1", "2"] {
            ctx.apply(StageOutcome::Continue(ContextUpdate {
                step_results: vec![StepResult {
                    step_id: id.to_string(),
                    tool: None,
                    input: None,
                    outcome: ToolOutcome::ok(json!({})),
                }],
                ..Default::default()
            }));
        }
        assert_eq!(ctx.step_results.len(), 2);
        assert_eq!(ctx.step_results[0].step_id, "1");
    }

    #[test]
    fn test_apply_plan_grows_never_shrinks() {
        let mut ctx = ExecutionContext::new("x");
        ctx.apply(StageOutcome::Continue(ContextUpdate {
            execution_plan: Some(ExecutionPlan {
                plan: vec![step("1"), step("2")],
            }),
            total_steps: Some(2),
            step_index: Some(0),
            ..Default::default()
        }));
        assert_eq!(ctx.plan_len(), 2);

        let mut grown = ctx.execution_plan.clone().unwrap();
        grown.plan.push(step("3"));
        ctx.apply(StageOutcome::Continue(ContextUpdate {
            execution_plan: Some(grown),
            total_steps: Some(3),
            ..Default::default()
        }));

        let plan = ctx.execution_plan.as_ref().unwrap();
        assert_eq!(plan.plan.len(), 3);
        // existing steps keep their identity
        assert_eq!(plan.plan[0].step_id, "1");
        assert_eq!(plan.plan[1].step_id, "2");
    }

    #[test]
    fn test_apply_none_fields_leave_state_untouched() {
        let mut ctx = ExecutionContext::new("x");
        ctx.apply(StageOutcome::Continue(ContextUpdate {
            verified: Some(true),
            ..Default::default()
        }));
        ctx.apply(StageOutcome::Continue(ContextUpdate::default()));

        assert_eq!(ctx.verified, Some(true));
        assert_eq!(ctx.messages.len(), 1);
    }

    #[test]
    fn test_fail_sets_status_and_error_only() {
        let mut ctx = ExecutionContext::new("x");
        ctx.apply(StageOutcome::Fail(ErrorInfo::new(
            ErrorKind::Parse,
            "bad json",
        )));

        assert_eq!(ctx.status, Status::Error);
        let err = ctx.last_error.as_ref().unwrap();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.message, "bad json");
        assert_eq!(ctx.messages.len(), 1);
    }

    #[test]
    fn test_last_error_is_overwritten_not_cleared() {
        let mut ctx = ExecutionContext::new("x");
        ctx.apply(StageOutcome::Fail(ErrorInfo::new(ErrorKind::Parse, "one")));
        ctx.apply(StageOutcome::Fail(ErrorInfo::new(
            ErrorKind::MissingStep,
            "two",
        )));

        let err = ctx.last_error.as_ref().unwrap();
        assert_eq!(err.kind, ErrorKind::MissingStep);
        assert_eq!(err.message, "two");
    }

    #[test]
    fn test_task_type_deserializes_known_and_unknown() {
        let known: TaskType = serde_json::from_value(json!("code_creation")).unwrap();
        assert_eq!(known, TaskType::CodeCreation);

        let unknown: TaskType = serde_json::from_value(json!("refactoring")).unwrap();
        assert_eq!(unknown, TaskType::Other);
    }

    #[test]
    fn test_error_kind_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorKind::Parse).unwrap(),
            json!("ParseError")
        );
        assert_eq!(
            serde_json::to_value(ErrorKind::ResponseGeneration).unwrap(),
            json!("ResponseGenerationError")
        );
        assert_eq!(ErrorKind::ModelInvocation.to_string(), "ModelInvocationError");
    }

    #[test]
    fn test_plan_step_tolerates_missing_optionals() {
        let step: PlanStep = serde_json::from_value(json!({
            "step_id": "1",
            "action": "look around"
        }))
        .unwrap();
        assert!(step.tool.is_none());
        assert!(step.tool_inputs.is_null());
    }
}
