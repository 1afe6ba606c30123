//! Tool contract and registry

pub mod filesystem;
pub mod memory;
pub mod normalize;
pub mod path_utils;
pub mod shell;
pub mod translate;

pub use filesystem::{ListFilesTool, ReadFileTool, SearchFilesTool, WriteFileTool};
pub use memory::{RetrieveMemoryTool, StoreMemoryTool};
pub use normalize::normalize_tool_input;
pub use shell::ExecuteCommandTool;
pub use translate::TranslateTextTool;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::context::ToolOutcome;

type BoxedTool = Box<dyn ToolTrait + Send + Sync>;

/// A capability the model can call
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema for the tool's input object
    fn parameters(&self) -> Value;
    /// Run the tool. Failures are returned as unsuccessful outcomes,
    /// never raised; a tool must not be able to crash the run.
    async fn execute(&self, input: Value) -> ToolOutcome;
}

/// Name/description pair shown to the model when choosing a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry-level failures
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool '{name}' not found")]
    NotFound { name: String, available: Vec<String> },
}

/// Name -> tool instance mapping, created once per process
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn ToolTrait + Send + Sync)> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Catalog shown to the model during step execution
    pub fn catalog(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Validate the input against the tool's schema, then run it.
    ///
    /// An unknown name is a typed error for the caller to record; a
    /// validation miss is an unsuccessful outcome, identical to an
    /// execute-time failure.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolOutcome, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
            available: self.names(),
        })?;

        if let Err(message) = validate_input(&tool.parameters(), &input) {
            return Ok(ToolOutcome::fail(message));
        }
        Ok(tool.execute(input).await)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every schema-required property is present and non-null
fn validate_input(schema: &Value, input: &Value) -> Result<(), String> {
    let Some(required) = schema["required"].as_array() else {
        return Ok(());
    };
    if required.is_empty() {
        return Ok(());
    }

    let Some(object) = input.as_object() else {
        return Err("input must be a json object".to_string());
    };

    for key in required.iter().filter_map(|v| v.as_str()) {
        match object.get(key) {
            Some(value) if !value.is_null() => {}
            _ => return Err(format!("missing required field '{key}'")),
        }
    }
    Ok(())
}

/// Register the standard toolset rooted at the given workspace
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    workspace: &Path,
    memory: opencoder_memory::MemoryStore,
    translator: Arc<dyn opencoder_provider::Provider>,
    translator_model: String,
) {
    // Filesystem tools
    registry.register(ReadFileTool::new(workspace.to_path_buf()));
    registry.register(WriteFileTool::new(workspace.to_path_buf()));
    registry.register(ListFilesTool::new(workspace.to_path_buf()));
    registry.register(SearchFilesTool::new(workspace.to_path_buf()));

    // Shell tool
    registry.register(ExecuteCommandTool::new(workspace.to_path_buf()));

    // Memory tools share one store
    registry.register(StoreMemoryTool::new(memory.clone()));
    registry.register(RetrieveMemoryTool::new(memory));

    // Translation tool
    registry.register(TranslateTextTool::new(translator, translator_model));
}
