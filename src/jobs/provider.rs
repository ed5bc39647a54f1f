use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::types::JobSnapshot;
use crate::error::{ImageGenError, Result};

/// 远程生成提供方的提交/轮询协议
///
/// 每次调用只发一个请求，重试与节奏由调用方负责。
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// 创建任务并返回提供方分配的 id
    async fn submit(&self, endpoint: &str, credential: &str, payload: &Value) -> Result<String>;

    async fn poll(&self, job_id: &str, credential: &str) -> Result<JobSnapshot>;
}

pub type DynJobProvider = Arc<dyn JobProvider>;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// HTTP 提供方：`POST {endpoint}` 提交，`GET {poll_url}?id=` 轮询
#[derive(Clone)]
pub struct HttpJobProvider {
    client: Client,
    poll_url: String,
    credential_header: String,
}

impl HttpJobProvider {
    /// 创建 HTTP 客户端
    ///
    /// 单次请求设置超时，整体等待时间由任务客户端控制
    fn create_client() -> Result<Client> {
        Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ImageGenError::from)
    }

    pub fn new(poll_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(Self::create_client()?, poll_url))
    }

    pub fn with_client(client: Client, poll_url: impl Into<String>) -> Self {
        Self {
            client,
            poll_url: poll_url.into(),
            credential_header: "x-key".to_string(),
        }
    }

    pub fn with_credential_header(mut self, header: impl Into<String>) -> Self {
        self.credential_header = header.into();
        self
    }
}

#[async_trait]
impl JobProvider for HttpJobProvider {
    async fn submit(&self, endpoint: &str, credential: &str, payload: &Value) -> Result<String> {
        let response = self
            .client
            .post(endpoint)
            .header(self.credential_header.as_str(), credential)
            .header("accept", "application/json")
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

        let submitted: SubmitResponse = response.json().await?;
        Ok(submitted.id)
    }

    async fn poll(&self, job_id: &str, credential: &str) -> Result<JobSnapshot> {
        let response = self
            .client
            .get(&self.poll_url)
            .query(&[("id", job_id)])
            .header(self.credential_header.as_str(), credential)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::ProviderPollError {
                job_id: job_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
