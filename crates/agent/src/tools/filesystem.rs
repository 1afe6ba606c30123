//! Filesystem tools

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

use super::path_utils::validate_workspace_path;
use super::ToolTrait;
use crate::context::ToolOutcome;

/// Largest number of matches a search returns
const MAX_SEARCH_MATCHES: usize = 200;

/// Read a file's contents
pub struct ReadFileTool {
    workspace: PathBuf,
}

impl ReadFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl ToolTrait for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }
    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string", "description": "File path" } },
            "required": ["path"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: ReadFileArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };
        let path = match validate_workspace_path(&args.path, &self.workspace).await {
            Ok(path) => path,
            Err(e) => return ToolOutcome::fail(e.to_string()),
        };

        debug!("reading {:?}", path);
        if !path.exists() {
            return ToolOutcome::fail(format!("no such file: {}", args.path));
        }
        if path.is_dir() {
            return ToolOutcome::fail(format!("path is a directory: {}", args.path));
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => ToolOutcome::ok(json!({
                "path": path.display().to_string(),
                "content": content,
            })),
            Err(e) => ToolOutcome::fail(format!("read failed: {e}")),
        }
    }
}

/// Create or overwrite a file
pub struct WriteFileTool {
    workspace: PathBuf,
}

impl WriteFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl ToolTrait for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "Create or overwrite a file with the given content. Parent directories are created as needed."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "content": { "type": "string", "description": "File content" }
            },
            "required": ["path", "content"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: WriteFileArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };
        let path = match validate_workspace_path(&args.path, &self.workspace).await {
            Ok(path) => path,
            Err(e) => return ToolOutcome::fail(e.to_string()),
        };

        debug!("writing {} bytes to {:?}", args.content.len(), path);
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolOutcome::fail(format!("could not create directories: {e}"));
            }
        }
        match tokio::fs::write(&path, &args.content).await {
            Ok(()) => ToolOutcome::ok(json!({
                "path": path.display().to_string(),
                "bytes_written": args.content.len(),
            })),
            Err(e) => ToolOutcome::fail(format!("write failed: {e}")),
        }
    }
}

/// List directory contents
pub struct ListFilesTool {
    workspace: PathBuf,
}

impl ListFilesTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ListFilesArgs {
    path: String,
    #[serde(default)]
    recursive: bool,
}

#[async_trait]
impl ToolTrait for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }
    fn description(&self) -> &str {
        "List the contents of a directory, optionally recursively."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Directory path" },
                "recursive": { "type": "boolean", "description": "Descend into subdirectories" }
            },
            "required": ["path"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: ListFilesArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };
        let path = match validate_workspace_path(&args.path, &self.workspace).await {
            Ok(path) => path,
            Err(e) => return ToolOutcome::fail(e.to_string()),
        };

        debug!("listing {:?} recursive={}", path, args.recursive);
        if !path.is_dir() {
            return ToolOutcome::fail(format!("not a directory: {}", args.path));
        }

        let max_depth = if args.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&path)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            files.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "path": entry.path().display().to_string(),
                "is_dir": entry.file_type().is_dir(),
            }));
        }

        ToolOutcome::ok(json!({
            "path": path.display().to_string(),
            "files": files,
        }))
    }
}

/// Search files by regular expression
pub struct SearchFilesTool {
    workspace: PathBuf,
}

impl SearchFilesTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct SearchFilesArgs {
    path: String,
    pattern: String,
}

#[async_trait]
impl ToolTrait for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }
    fn description(&self) -> &str {
        "Search files under a directory for lines matching a regular expression."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Directory to search" },
                "pattern": { "type": "string", "description": "Regular expression" }
            },
            "required": ["path", "pattern"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: SearchFilesArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };
        let path = match validate_workspace_path(&args.path, &self.workspace).await {
            Ok(path) => path,
            Err(e) => return ToolOutcome::fail(e.to_string()),
        };
        let pattern = match regex::Regex::new(&args.pattern) {
            Ok(pattern) => pattern,
            Err(e) => return ToolOutcome::fail(format!("invalid pattern: {e}")),
        };

        debug!("searching {:?} for /{}/", path, args.pattern);
        let mut matches = Vec::new();
        'files: for entry in WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            // Binary and other non-utf8 files are skipped
            let Ok(content) = tokio::fs::read_to_string(entry.path()).await else {
                continue;
            };
            for (number, line) in content.lines().enumerate() {
                if pattern.is_match(line) {
                    matches.push(json!({
                        "file": entry.path().display().to_string(),
                        "line": number + 1,
                        "content": line,
                    }));
                    if matches.len() >= MAX_SEARCH_MATCHES {
                        break 'files;
                    }
                }
            }
        }

        ToolOutcome::ok(json!({
            "path": path.display().to_string(),
            "pattern": args.pattern,
            "matches": matches,
            "truncated": matches.len() >= MAX_SEARCH_MATCHES,
        }))
    }
}
