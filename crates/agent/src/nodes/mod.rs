//! Stage nodes
//!
//! The seven processing functions of the task-execution state machine.
//! Every node takes the context by reference and returns a
//! [`crate::context::StageOutcome`]; expected model-output problems
//! become `Fail` data, never errors. The translate node is the one
//! exception: a transport failure there propagates, because translation
//! is foundational and has no degraded path.

mod analyze_task;
mod execute_step;
mod generate_response;
mod handle_error;
mod plan_execution;
mod translate_input;
mod verify_result;

pub use analyze_task::analyze_task;
pub use execute_step::execute_step;
pub use generate_response::generate_response;
pub use handle_error::handle_error;
pub use plan_execution::plan_execution;
pub use translate_input::translate_input;
pub use verify_result::verify_result;
