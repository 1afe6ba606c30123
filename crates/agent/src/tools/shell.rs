//! Shell command tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::path_utils::validate_workspace_path;
use super::ToolTrait;
use crate::context::ToolOutcome;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_OUTPUT_LEN: usize = 10_000;

/// Run a shell command inside the workspace
pub struct ExecuteCommandTool {
    workspace: PathBuf,
    timeout_secs: u64,
}

impl ExecuteCommandTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self {
            workspace,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(workspace: PathBuf, timeout_secs: u64) -> Self {
        Self {
            workspace,
            timeout_secs,
        }
    }
}

#[derive(Deserialize)]
struct ExecuteCommandArgs {
    command: String,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

fn truncate(text: String) -> String {
    if text.len() <= MAX_OUTPUT_LEN {
        return text;
    }
    let mut cut = MAX_OUTPUT_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n[output truncated, {} bytes omitted]", &text[..cut], text.len() - cut)
}

#[async_trait]
impl ToolTrait for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }
    fn description(&self) -> &str {
        "Run a shell command and return its stdout, stderr and exit code."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command" },
                "cwd": { "type": "string", "description": "Optional working directory" },
                "timeout_secs": { "type": "number", "description": "Optional timeout in seconds" }
            },
            "required": ["command"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: ExecuteCommandArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };

        let working_dir = match &args.cwd {
            Some(dir) => match validate_workspace_path(dir, &self.workspace).await {
                Ok(dir) => dir,
                Err(e) => return ToolOutcome::fail(e.to_string()),
            },
            None => self.workspace.clone(),
        };
        let timeout_secs = args.timeout_secs.unwrap_or(self.timeout_secs);

        debug!("executing `{}` in {:?}", args.command, working_dir);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&args.command)
            .current_dir(&working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(
            tokio::time::Duration::from_secs(timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return ToolOutcome::fail(format!("command failed to start: {e}")),
            Err(_) => {
                return ToolOutcome::fail(format!("command timed out after {timeout_secs} seconds"))
            }
        };

        let stdout = truncate(String::from_utf8_lossy(&output.stdout).to_string());
        let stderr = truncate(String::from_utf8_lossy(&output.stderr).to_string());
        let exit_code = output.status.code().unwrap_or(-1);

        let payload = json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": exit_code,
        });

        if output.status.success() {
            ToolOutcome::ok(payload)
        } else {
            ToolOutcome {
                success: false,
                payload,
                error: Some(format!("command exited with status {exit_code}")),
            }
        }
    }
}
