//! 图片生成工具 - 同步请求/响应型提供方

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ImageGenError, Result};
use crate::tools::artifacts::ArtifactClient;
use crate::tools::tool::{Tool, ToolContext, ToolInvocation, ToolOutput};

#[derive(Debug, Deserialize)]
struct DirectResponse {
    #[serde(default)]
    data: Vec<DirectImage>,
}

#[derive(Debug, Deserialize)]
struct DirectImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

/// 同步图片生成工具：提供方在一次响应中直接返回结果
///
/// 输入参数与 [`ImageGeneratorTool`](super::image_generator::ImageGeneratorTool) 相同：
/// `payload` / `output_url` / `output_content_type`。
pub struct DirectImageTool {
    client: Client,
    artifacts: ArtifactClient,
    endpoint: String,
    credential_name: String,
}

impl DirectImageTool {
    pub fn new(
        client: Client,
        artifacts: ArtifactClient,
        endpoint: impl Into<String>,
        credential_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            artifacts,
            endpoint: endpoint.into(),
            credential_name: credential_name.into(),
        }
    }

    async fn generate(&self, credential: &str, payload: &Value) -> Result<DirectImage> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::ProviderSubmitError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DirectResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageGenError::Http("provider returned no images".to_string()))
    }
}

#[async_trait]
impl Tool for DirectImageTool {
    fn name(&self) -> &'static str {
        "image_direct"
    }

    fn description(&self) -> &'static str {
        "Generates an image with a single synchronous provider call"
    }

    async fn call(&self, invocation: ToolInvocation, ctx: &ToolContext) -> Result<ToolOutput> {
        let payload = &invocation.input["payload"];
        if !payload.is_object() {
            return Err(ImageGenError::InvalidInput(
                "`payload` must be a JSON object".to_string(),
            ));
        }
        let credential = ctx.secrets().get_secret(&self.credential_name).await?;
        let image = self.generate(&credential, payload).await?;

        let Some(output_url) = invocation.optional_str("output_url") else {
            let artifact_ref = image.url.ok_or_else(|| {
                ImageGenError::InvalidInput(
                    "provider returned inline image data; `output_url` is required".to_string(),
                )
            })?;
            return Ok(ToolOutput::new(
                self.name(),
                json!({ "success": true, "artifact_ref": artifact_ref, "uploaded": false }),
            ));
        };

        let (bytes, source_type) = match (image.b64_json, image.url.as_deref()) {
            (Some(encoded), _) => {
                let decoded = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                    ImageGenError::Serialization(format!("invalid base64 image data: {e}"))
                })?;
                (Bytes::from(decoded), "image/png".to_string())
            }
            (None, Some(url)) => {
                let artifact = self.artifacts.fetch_input(url).await?;
                let content_type = artifact.content_type_or_infer(url);
                (artifact.bytes, content_type)
            }
            (None, None) => {
                return Err(ImageGenError::Http(
                    "provider returned an empty image entry".to_string(),
                ))
            }
        };

        let content_type = invocation
            .optional_str("output_content_type")
            .map(str::to_string)
            .unwrap_or(source_type);
        let size_bytes = bytes.len();
        self.artifacts
            .put_output(output_url, bytes, &content_type)
            .await?;

        Ok(ToolOutput::new(
            self.name(),
            json!({
                "success": true,
                "artifact_ref": image.url.unwrap_or_else(|| output_url.to_string()),
                "content_type": content_type,
                "size_bytes": size_bytes,
                "uploaded": true
            }),
        ))
    }
}

