use std::env;

use async_trait::async_trait;

use crate::error::{ImageGenError, Result};

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 从环境变量获取值，空字符串视为未设置
    pub fn get_env(key: &str) -> Result<String> {
        Self::get_env_optional(key).ok_or_else(|| ImageGenError::MissingConfiguration(key.into()))
    }

    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.is_empty())
    }

    /// 读取可解析的环境变量，未设置时返回默认值
    pub fn get_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
        match Self::get_env_optional(key) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ImageGenError::InvalidInput(format!("environment variable `{key}` is malformed"))
            }),
            None => Ok(default),
        }
    }

    /// 检查是否启用调试模式
    pub fn is_debug_mode() -> bool {
        env::var("IMAGEGEN_DEBUG").is_ok()
    }
}

/// 命名凭据的外部来源
///
/// `required` 为真且值不存在时必须返回 [`ImageGenError::MissingConfiguration`]，
/// 否则返回 `Ok(None)`。
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str, required: bool) -> Result<Option<String>>;
}

/// 从进程环境变量解析密钥
#[derive(Clone, Debug, Default)]
pub struct EnvResolver {
    prefix: Option<String>,
}

impl EnvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找 `{prefix}{name}` 而不是 `name`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

#[async_trait]
impl SecretResolver for EnvResolver {
    async fn resolve(&self, name: &str, required: bool) -> Result<Option<String>> {
        let key = self.key(name);
        match EnvConfig::get_env_optional(&key) {
            Some(value) => Ok(Some(value)),
            None if required => Err(ImageGenError::MissingConfiguration(key)),
            None => Ok(None),
        }
    }
}
