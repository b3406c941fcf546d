//! Tool trait and registry

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::Result;

/// A callable tool exposed through `tools/list` and `tools/call`
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with its `arguments` object
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique tool name
    fn name(&self) -> &str;

    /// Description shown to the calling agent
    fn description(&self) -> &str;

    /// JSON Schema of the `arguments` object
    fn input_schema(&self) -> Value;

    /// Entry for `tools/list`
    fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

/// Tools by name
///
/// Filled once before the server starts; read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        async fn execute(&self, params: Value) -> Result<Value> {
            Ok(params)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Returns its arguments"
        }

        fn input_schema(&self) -> Value {
            json!({ "type": "object" })
        }
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Echo));

        assert_eq!(registry.len(), 1);
        let tool = registry.get("echo").unwrap();
        let out = tool.execute(json!({ "x": 1 })).await.unwrap();
        assert_eq!(out["x"], 1);
        assert!(registry.get("missing").is_none());

        let defs = registry.definitions();
        assert_eq!(defs[0]["inputSchema"]["type"], "object");
    }
}
