use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::secrets::SecretStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
}

impl ToolInvocation {
    pub fn new<T: Into<String>>(name: T, input: Value) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }

    pub fn optional_str(&self, key: &str) -> Option<&str> {
        self.input[key].as_str().filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool: String,
    pub content: Value,
}

impl ToolOutput {
    pub fn new(tool: impl Into<String>, content: Value) -> Self {
        Self {
            tool: tool.into(),
            content,
        }
    }
}

/// 每次调用传给工具的上下文
#[derive(Clone)]
pub struct ToolContext {
    secrets: Arc<SecretStore>,
    cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(secrets: Arc<SecretStore>) -> Self {
        Self {
            secrets,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    async fn call(&self, invocation: ToolInvocation, ctx: &ToolContext) -> Result<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn invocation_carries_only_name_and_input() {
        let invocation: ToolInvocation = serde_json::from_value(json!({
            "name": "image_generator",
            "input": { "output_url": "", "output_content_type": "image/png" }
        }))
        .unwrap();

        assert_eq!(invocation.optional_str("output_url"), None);
        assert_eq!(invocation.optional_str("output_content_type"), Some("image/png"));
        assert_eq!(invocation.optional_str("missing"), None);
        assert_eq!(
            serde_json::to_value(&invocation).unwrap(),
            json!({
                "name": "image_generator",
                "input": { "output_url": "", "output_content_type": "image/png" }
            })
        );
    }
}
