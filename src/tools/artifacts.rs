//! 通过 HTTP 传输输入/输出产物

use bytes::Bytes;
use reqwest::Client;
use tracing::info;

use crate::error::{ImageGenError, Result};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 已下载的产物
#[derive(Clone, Debug)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl Artifact {
    /// 来源返回的 Content-Type，缺失时根据 URL 推断
    pub fn content_type_or_infer(&self, url: &str) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| infer_content_type(url).to_string())
    }
}

#[derive(Clone, Default)]
pub struct ArtifactClient {
    client: Client,
}

impl ArtifactClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch_input(&self, url: &str) -> Result<Artifact> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ImageGenError::Http(format!(
                "artifact download failed with HTTP status: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?;
        Ok(Artifact {
            bytes,
            content_type,
        })
    }

    /// 以显式 `Content-Type` 通过 HTTP PUT 上传 `bytes`
    pub async fn put_output(&self, url: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let response = self
            .client
            .put(url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ImageGenError::Http(format!(
                "artifact upload failed with HTTP status: {}",
                response.status()
            )));
        }
        info!(size_bytes = size, content_type, "artifact uploaded");
        Ok(())
    }
}

/// 根据 URL 后缀推断图片类型
pub fn infer_content_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let extension = path
        .rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
