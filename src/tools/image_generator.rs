//! 图片生成工具 - 异步提交/轮询型提供方

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use crate::error::{ImageGenError, Result};
use crate::jobs::AsyncJobClient;
use crate::tools::artifacts::ArtifactClient;
use crate::tools::tool::{Tool, ToolContext, ToolInvocation, ToolOutput};

/// 异步图片生成工具
///
/// 输入参数：
/// - payload: 原样提交给提供方的任务参数（必填，JSON 对象）
/// - input_image_url: 可选，下载后以 base64 写入 `payload.input_image`
/// - output_url: 可选，生成结果通过 HTTP PUT 上传到该地址
/// - output_content_type: 可选，上传时使用的 Content-Type
///
/// 示例输入：
/// ```json
/// {
///   "payload": { "prompt": "a lighthouse at dusk", "aspect_ratio": "16:9" },
///   "output_url": "https://storage.example.com/upload/abc"
/// }
/// ```
pub struct ImageGeneratorTool {
    jobs: AsyncJobClient,
    artifacts: ArtifactClient,
    submit_endpoint: String,
    credential_name: String,
}

impl ImageGeneratorTool {
    pub fn new(
        jobs: AsyncJobClient,
        artifacts: ArtifactClient,
        submit_endpoint: impl Into<String>,
        credential_name: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            artifacts,
            submit_endpoint: submit_endpoint.into(),
            credential_name: credential_name.into(),
        }
    }

    async fn build_payload(&self, invocation: &ToolInvocation) -> Result<Value> {
        let mut payload = invocation.input["payload"].clone();
        let Some(fields) = payload.as_object_mut() else {
            return Err(ImageGenError::InvalidInput(
                "`payload` must be a JSON object".to_string(),
            ));
        };

        if let Some(url) = invocation.optional_str("input_image_url") {
            let input = self.artifacts.fetch_input(url).await?;
            fields.insert("input_image".to_string(), json!(STANDARD.encode(&input.bytes)));
        }
        Ok(payload)
    }
}

#[async_trait]
impl Tool for ImageGeneratorTool {
    fn name(&self) -> &'static str {
        "image_generator"
    }

    fn description(&self) -> &'static str {
        "Submits an image generation job and waits for the result"
    }

    async fn call(&self, invocation: ToolInvocation, ctx: &ToolContext) -> Result<ToolOutput> {
        let payload = self.build_payload(&invocation).await?;
        let credential = ctx.secrets().get_secret(&self.credential_name).await?;

        let outcome = self
            .jobs
            .run(
                &self.submit_endpoint,
                &credential,
                &payload,
                self.jobs.config().timeout,
                ctx.cancellation(),
            )
            .await?;

        let mut uploaded = false;
        if let Some(output_url) = invocation.optional_str("output_url") {
            let artifact = self.artifacts.fetch_input(&outcome.artifact_ref).await?;
            let content_type = match invocation.optional_str("output_content_type") {
                Some(content_type) => content_type.to_string(),
                None => artifact.content_type_or_infer(&outcome.artifact_ref),
            };
            self.artifacts
                .put_output(output_url, artifact.bytes, &content_type)
                .await?;
            uploaded = true;
        }

        Ok(ToolOutput::new(
            self.name(),
            json!({
                "success": true,
                "job_id": outcome.job_id,
                "artifact_ref": outcome.artifact_ref,
                "seed": outcome.seed,
                "uploaded": uploaded
            }),
        ))
    }
}
