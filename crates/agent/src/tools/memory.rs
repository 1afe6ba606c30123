//! Memory tools
//!
//! Store and retrieve facts in the shared key-value store. The store is
//! supplied by the runtime and outlives individual requests.

use async_trait::async_trait;
use opencoder_memory::MemoryStore;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::ToolTrait;
use crate::context::ToolOutcome;

/// Save a value under a key
pub struct StoreMemoryTool {
    store: MemoryStore,
}

impl StoreMemoryTool {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct StoreMemoryArgs {
    key: String,
    value: Value,
}

#[async_trait]
impl ToolTrait for StoreMemoryTool {
    fn name(&self) -> &str {
        "store_memory"
    }
    fn description(&self) -> &str {
        "Store a value in memory under a key for later retrieval."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "Memory key" },
                "value": { "description": "Value to remember" }
            },
            "required": ["key", "value"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: StoreMemoryArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };

        debug!("storing memory key '{}'", args.key);
        self.store.set(args.key.clone(), args.value).await;
        ToolOutcome::ok(json!({ "key": args.key }))
    }
}

/// Fetch a value by key
pub struct RetrieveMemoryTool {
    store: MemoryStore,
}

impl RetrieveMemoryTool {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
struct RetrieveMemoryArgs {
    key: String,
}

#[async_trait]
impl ToolTrait for RetrieveMemoryTool {
    fn name(&self) -> &str {
        "retrieve_memory"
    }
    fn description(&self) -> &str {
        "Retrieve a previously stored value from memory by key."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string", "description": "Memory key" }
            },
            "required": ["key"]
        })
    }
    async fn execute(&self, input: Value) -> ToolOutcome {
        let args: RetrieveMemoryArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => return ToolOutcome::fail(format!("invalid input: {e}")),
        };

        match self.store.get(&args.key).await {
            Some(value) => ToolOutcome::ok(json!({ "key": args.key, "value": value })),
            None => ToolOutcome::fail(format!("no memory stored under key '{}'", args.key)),
        }
    }
}
