use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::SecretResolver;
use crate::error::{ImageGenError, Result};

/// 缓存的密钥有效期为五分钟
pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CachedSecret {
    value: String,
    expires_at: Instant,
}

/// 带 TTL 的密钥缓存
///
/// 命中且未过期时直接返回；否则委托给 [`SecretResolver`] 解析并以
/// `now + ttl` 重新写入。缓存只能整体清空。
pub struct SecretStore {
    resolver: Arc<dyn SecretResolver>,
    ttl: Duration,
    inner: RwLock<HashMap<String, CachedSecret>>,
}

impl SecretStore {
    pub fn new(resolver: Arc<dyn SecretResolver>) -> Self {
        Self::with_ttl(resolver, DEFAULT_SECRET_TTL)
    }

    pub fn with_ttl(resolver: Arc<dyn SecretResolver>, ttl: Duration) -> Self {
        Self {
            resolver,
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// 返回密钥 `name`，缺失或过期时重新解析
    pub async fn get_secret(&self, name: &str) -> Result<String> {
        if let Some(value) = self.cached(name) {
            return Ok(value);
        }

        debug!(secret = %name, "resolving secret");
        let value = self
            .resolver
            .resolve(name, true)
            .await?
            .ok_or_else(|| ImageGenError::MissingConfiguration(name.to_string()))?;
        self.insert(name, value.clone());
        Ok(value)
    }

    /// 同 [`get_secret`](Self::get_secret)，但未设置时返回 `None` 且不缓存
    pub async fn get_optional(&self, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.cached(name) {
            return Ok(Some(value));
        }

        let resolved = self.resolver.resolve(name, false).await?;
        if let Some(ref value) = resolved {
            self.insert(name, value.clone());
        }
        Ok(resolved)
    }

    pub fn clear_cache(&self) {
        self.inner.write().clear();
    }

    fn cached(&self, name: &str) -> Option<String> {
        let guard = self.inner.read();
        let entry = guard.get(name)?;
        if Instant::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn insert(&self, name: &str, value: String) {
        let expires_at = Instant::now() + self.ttl;
        self.inner
            .write()
            .insert(name.to_string(), CachedSecret { value, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct CountingResolver {
        calls: AtomicUsize,
        value: Option<&'static str>,
    }

    impl CountingResolver {
        fn new(value: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                value,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SecretResolver for CountingResolver {
        async fn resolve(&self, name: &str, required: bool) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.value {
                Some(v) => Ok(Some(v.to_string())),
                None if required => Err(ImageGenError::MissingConfiguration(name.to_string())),
                None => Ok(None),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cached_within_ttl() {
        let resolver = CountingResolver::new(Some("shh"));
        let store = SecretStore::new(resolver.clone());

        assert_eq!(store.get_secret("KEY").await.unwrap(), "shh");
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(store.get_secret("KEY").await.unwrap(), "shh");
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn re_resolves_after_ttl() {
        let resolver = CountingResolver::new(Some("shh"));
        let store = SecretStore::new(resolver.clone());

        store.get_secret("KEY").await.unwrap();
        tokio::time::advance(DEFAULT_SECRET_TTL).await;
        store.get_secret("KEY").await.unwrap();
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn clear_cache_forces_resolution() {
        let resolver = CountingResolver::new(Some("shh"));
        let store = SecretStore::new(resolver.clone());

        store.get_secret("KEY").await.unwrap();
        store.clear_cache();
        store.get_secret("KEY").await.unwrap();
        assert_eq!(resolver.calls(), 2);
    }

    #[tokio::test]
    async fn missing_required_secret() {
        let resolver = CountingResolver::new(None);
        let store = SecretStore::new(resolver.clone());

        let err = store.get_secret("KEY").await.unwrap_err();
        assert!(matches!(err, ImageGenError::MissingConfiguration(name) if name == "KEY"));
        assert_eq!(store.get_optional("KEY").await.unwrap(), None);
        // 缺失的可选值不缓存
        store.get_optional("KEY").await.unwrap();
        assert_eq!(resolver.calls(), 3);
    }
}
