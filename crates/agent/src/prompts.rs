//! Stage prompt templates
//!
//! One template per model-calling stage, with `{name}` placeholders
//! substituted from JSON-serialized context fragments. Stages must
//! tolerate the model wrapping its JSON answer in a fenced block or
//! burying it in prose; see [`crate::extract`].

pub const TRANSLATE_INPUT_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to translate the user's request into English.

User Request:
{user_request}

Translate this request into English. Provide only the translation without additional explanation."#;

pub const TASK_ANALYSIS_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to analyze the user's request and categorize it into logical subtasks.

User Request:
{user_request}

Analyze this request and categorize it. First, determine if this is a simple response query that doesn't require any tools (like explaining a concept, providing documentation, or offering code examples from memory).

If it's a simple response query:
- Set task_type to "simple_response"
- You can leave subtasks empty or provide a minimal structure

If it requires tools or complex execution (creating or editing files, analyzing file contents, running commands):
- Determine the appropriate task_type
- Break it down into subtasks
- For each subtask, determine what needs to be done, what tools might be needed, and dependencies

Respond in JSON format:
{
  "task_type": "simple_response | code_creation | code_modification | code_analysis | environment_setup",
  "requires_tools": true/false,
  "subtasks": [
    {
      "id": "1",
      "description": "...",
      "potential_tools": ["...", "..."],
      "dependencies": ["..."]
    }
  ]
}"#;

pub const PLANNING_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to create a detailed plan to perform the following tasks:

Task Analysis:
{task_analysis}

Create a step-by-step plan to perform these tasks. For each step, specify:
1. What to do
2. What tools to use (if any)
3. How to validate the results

Respond in JSON format:
{
  "plan": [
    {
      "step_id": "1",
      "action": "...",
      "tool": "...",
      "tool_inputs": {...},
      "validation": "..."
    }
  ]
}"#;

pub const EXECUTE_STEP_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to execute the next step in the plan:

Current Step:
{current_step}

Available Tools:
{available_tools}

Execute this step and report the results. If you need to use a tool, specify the tool call in the following format:
{
  "tool": "tool_name",
  "input": {
    "parameter1": "value1",
    "parameter2": "value2"
  }
}"#;

pub const VERIFY_RESULT_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to verify the execution results and handle any errors:

Execution Results:
{execution_results}

Original Plan:
{original_plan}

Verify these results and determine:
1. Whether all steps were completed successfully
2. Whether any errors occurred and, if so, how they can be resolved
3. Whether additional steps are needed

Respond in JSON format:
{
  "success": true/false,
  "errors": [
    {
      "step_id": "...",
      "error": "...",
      "resolution": "..."
    }
  ],
  "additional_steps": [
    {
      "step_id": "...",
      "action": "...",
      "tool": "...",
      "tool_inputs": {...},
      "validation": "..."
    }
  ]
}"#;

pub const GENERATE_RESPONSE_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to generate a final response to the user:

Original Request:
{original_request}

Execution Results:
{execution_results}

Verification Report:
{verification_report}

Based on this information, generate a clear and useful response for the user. Include:
1. A summary of the tasks performed
2. Any problems encountered and how they were resolved
3. Suggestions for next steps the user should take

Your response should be friendly and professional."#;

pub const DIRECT_RESPONSE_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to generate a direct response to the user's request without using any external tools:

Original Request:
{original_request}

Task Analysis:
{task_analysis}

Provide a clear, concise, and helpful response based on your knowledge. Since this is a direct response without tool execution:
1. Answer the user's question using your built-in knowledge
2. If you're providing code examples, make sure they are well-formatted and explained
3. If you're explaining a concept, be thorough but accessible

Your response should be friendly and professional."#;

pub const HANDLE_ERROR_PROMPT: &str = r#"You are OpenCoder, a professional coding assistant.
Your task is to handle an error that has occurred:

Error Information:
{error_info}

Context:
{context}

Analyze this error and determine:
1. The cause of the error
2. Possible solutions
3. A clear explanation to provide to the user

Respond in JSON format:
{
  "error_type": "...",
  "cause": "...",
  "resolution": "...",
  "user_message": "..."
}"#;

/// Substitute named `{placeholder}` values into a template.
///
/// Only the given names are replaced; literal braces elsewhere in the
/// template (JSON examples) pass through untouched.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (name, value) in substitutions {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}
