pub mod artifacts;
pub mod image_direct;
pub mod image_generator;
pub mod registry;
pub mod tool;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

pub use artifacts::{Artifact, ArtifactClient};
pub use image_direct::DirectImageTool;
pub use image_generator::ImageGeneratorTool;
pub use registry::{ToolDescriptor, ToolRegistry};
pub use tool::{Tool, ToolContext, ToolInvocation, ToolOutput};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::jobs::{AsyncJobClient, HttpJobProvider, JobClientConfig};

/// 根据服务配置注册内置工具，未配置的提供方对应的工具不会注册
pub fn register_builtin_tools(registry: &mut ToolRegistry, config: &ServiceConfig) -> Result<()> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?;
    let artifacts = ArtifactClient::new(client.clone());

    if let Some(provider) = &config.async_provider {
        let http = HttpJobProvider::new(provider.poll_url.clone())?
            .with_credential_header(provider.credential_header.clone());
        let jobs = AsyncJobClient::with_config(
            Arc::new(http),
            JobClientConfig {
                poll_interval: config.poll_interval,
                timeout: config.job_timeout,
            },
        );
        registry.register(Arc::new(ImageGeneratorTool::new(
            jobs,
            artifacts.clone(),
            provider.submit_endpoint.clone(),
            provider.credential_name.clone(),
        )));
    }

    if let Some(provider) = &config.sync_provider {
        registry.register(Arc::new(DirectImageTool::new(
            client,
            artifacts,
            provider.endpoint.clone(),
            provider.credential_name.clone(),
        )));
    }

    Ok(())
}
