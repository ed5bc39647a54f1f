use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::{ImageGenError, Result};
use crate::tools::tool::{Tool, ToolContext, ToolInvocation, ToolOutput};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(Arc::clone)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect()
    }

    pub async fn invoke(&self, invocation: ToolInvocation, ctx: &ToolContext) -> Result<ToolOutput> {
        let tool = self
            .get(&invocation.name)
            .ok_or_else(|| ImageGenError::ToolNotRegistered(invocation.name.clone()))?;
        info!(tool = %invocation.name, "invoking tool");
        tool.call(invocation, ctx).await
    }
}
