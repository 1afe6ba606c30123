//! OpenCoder task-execution core
//!
//! Turns one user request into a sequence of tool invocations and a final
//! natural-language answer, driven by a fixed seven-stage state machine:
//! translate, analyze, plan, execute-step, verify, respond, with an
//! error-handling branch. All state lives in an [`ExecutionContext`] that
//! exists for exactly one request/response cycle.

use thiserror::Error;

pub mod context;
pub mod driver;
pub mod extract;
pub mod model;
pub mod nodes;
pub mod prompts;
pub mod router;
pub mod tools;

pub use context::{ExecutionContext, Status};
pub use driver::GraphDriver;
pub use model::ModelHandle;
pub use router::{route, Route};
pub use tools::{ToolRegistry, ToolTrait};

/// Failures that escape the state machine.
///
/// Almost nothing does: expected model-output problems become context
/// data and are explained to the user by the error-handling stage. The
/// one exception is a transport failure while translating the input,
/// before the machine has anything to degrade to.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("input translation failed: {0}")]
    Translation(#[from] opencoder_provider::ProviderError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
