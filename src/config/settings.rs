use std::time::Duration;

use super::env::EnvConfig;
use crate::error::Result;
use crate::jobs::{DEFAULT_JOB_TIMEOUT, DEFAULT_POLL_INTERVAL};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_HMAC_SECRET_NAME: &str = "IMAGEGEN_HMAC_SECRET";

/// 服务配置，全部来自环境变量
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind: String,
    /// Secret Store 中 HMAC 共享密钥的名称
    pub hmac_secret_name: String,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
    pub async_provider: Option<AsyncProviderConfig>,
    pub sync_provider: Option<SyncProviderConfig>,
}

/// 提交/轮询型提供方配置
#[derive(Clone, Debug)]
pub struct AsyncProviderConfig {
    pub submit_endpoint: String,
    pub poll_url: String,
    pub credential_header: String,
    pub credential_name: String,
}

/// 同步请求/响应型提供方配置
#[derive(Clone, Debug)]
pub struct SyncProviderConfig {
    pub endpoint: String,
    pub credential_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            hmac_secret_name: DEFAULT_HMAC_SECRET_NAME.to_string(),
            job_timeout: DEFAULT_JOB_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            async_provider: None,
            sync_provider: None,
        }
    }
}

impl ServiceConfig {
    /// 从环境变量加载配置
    ///
    /// - `IMAGEGEN_BIND`: 监听地址
    /// - `IMAGEGEN_HMAC_SECRET_NAME`: HMAC 密钥名称
    /// - `IMAGEGEN_JOB_TIMEOUT_SECS` / `IMAGEGEN_POLL_INTERVAL_MS`: 任务超时与轮询间隔
    /// - `IMAGEGEN_ASYNC_SUBMIT_URL` + `IMAGEGEN_ASYNC_POLL_URL`: 启用异步提供方
    /// - `IMAGEGEN_SYNC_URL`: 启用同步提供方
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let timeout_secs =
            EnvConfig::get_parsed_or("IMAGEGEN_JOB_TIMEOUT_SECS", defaults.job_timeout.as_secs())?;
        let interval_ms = EnvConfig::get_parsed_or(
            "IMAGEGEN_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;

        let async_provider = match (
            EnvConfig::get_env_optional("IMAGEGEN_ASYNC_SUBMIT_URL"),
            EnvConfig::get_env_optional("IMAGEGEN_ASYNC_POLL_URL"),
        ) {
            (Some(submit_endpoint), Some(poll_url)) => Some(AsyncProviderConfig {
                submit_endpoint,
                poll_url,
                credential_header: EnvConfig::get_env_optional("IMAGEGEN_ASYNC_CREDENTIAL_HEADER")
                    .unwrap_or_else(|| "x-key".to_string()),
                credential_name: EnvConfig::get_env_optional("IMAGEGEN_ASYNC_CREDENTIAL_NAME")
                    .unwrap_or_else(|| "IMAGEGEN_ASYNC_API_KEY".to_string()),
            }),
            _ => None,
        };

        let sync_provider =
            EnvConfig::get_env_optional("IMAGEGEN_SYNC_URL").map(|endpoint| SyncProviderConfig {
                endpoint,
                credential_name: EnvConfig::get_env_optional("IMAGEGEN_SYNC_CREDENTIAL_NAME")
                    .unwrap_or_else(|| "IMAGEGEN_SYNC_API_KEY".to_string()),
            });

        Ok(Self {
            bind: EnvConfig::get_env_optional("IMAGEGEN_BIND").unwrap_or(defaults.bind),
            hmac_secret_name: EnvConfig::get_env_optional("IMAGEGEN_HMAC_SECRET_NAME")
                .unwrap_or(defaults.hmac_secret_name),
            job_timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_millis(interval_ms),
            async_provider,
            sync_provider,
        })
    }
}
