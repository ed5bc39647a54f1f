use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tracing::debug;

use super::signature;
use crate::error::{ImageGenError, Result};
use crate::secrets::SecretStore;

pub const SIGNATURE_HEADER: &str = "X-HMAC-Signature";
pub const TIMESTAMP_HEADER: &str = "X-HMAC-Timestamp";

/// 签名方与校验方之间允许的最大时钟偏差（秒）
pub const DEFAULT_MAX_SKEW_SECS: u64 = 300;

pub const REASON_MISSING_HEADERS: &str = "missing headers";
pub const REASON_TIMESTAMP_EXPIRED: &str = "timestamp expired";
pub const REASON_INVALID_SIGNATURE: &str = "invalid signature";

/// 待验证的入站请求
#[derive(Clone, Debug)]
pub struct SignedRequest {
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    pub method: String,
    pub path: String,
    pub body: Bytes,
}

impl SignedRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            signature: None,
            timestamp: None,
            method: method.into(),
            path: path.into(),
            body: body.into(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// 验证结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Authorized,
    Unauthorized(&'static str),
}

impl Verdict {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Verdict::Authorized)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Verdict::Authorized => Ok(()),
            Verdict::Unauthorized(reason) => Err(ImageGenError::Unauthorized(reason.to_string())),
        }
    }
}

/// 判定入站请求是否已授权
///
/// 公开路径直接放行；其余请求需要新鲜的时间戳，以及用 [`SecretStore`]
/// 中 `secret_name` 对应共享密钥计算的 HMAC-SHA256 签名。
#[derive(Clone)]
pub struct RequestVerifier {
    secrets: Arc<SecretStore>,
    secret_name: String,
    public_paths: Arc<HashSet<String>>,
    max_skew_secs: u64,
}

impl RequestVerifier {
    pub fn new(secrets: Arc<SecretStore>, secret_name: impl Into<String>) -> Self {
        Self {
            secrets,
            secret_name: secret_name.into(),
            public_paths: Arc::new(HashSet::new()),
            max_skew_secs: DEFAULT_MAX_SKEW_SECS,
        }
    }

    pub fn with_public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_paths = Arc::new(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.contains(path)
    }

    pub async fn verify(&self, request: &SignedRequest) -> Result<Verdict> {
        self.verify_at(request, unix_now()).await
    }

    /// 使用显式给定的 Unix 秒时钟进行校验
    ///
    /// 只有密钥解析失败才返回错误；所有认证失败都是 [`Verdict::Unauthorized`]。
    pub async fn verify_at(&self, request: &SignedRequest, now_secs: u64) -> Result<Verdict> {
        if self.is_public(&request.path) {
            return Ok(Verdict::Authorized);
        }

        let (Some(provided), Some(timestamp)) = (&request.signature, &request.timestamp) else {
            return Ok(Verdict::Unauthorized(REASON_MISSING_HEADERS));
        };
        let Ok(ts) = timestamp.parse::<u64>() else {
            return Ok(Verdict::Unauthorized(REASON_MISSING_HEADERS));
        };

        if now_secs.abs_diff(ts) > self.max_skew_secs {
            debug!(path = %request.path, "rejected stale request timestamp");
            return Ok(Verdict::Unauthorized(REASON_TIMESTAMP_EXPIRED));
        }

        let secret = self.secrets.get_secret(&self.secret_name).await?;
        let valid = signature::verify(
            &secret,
            timestamp,
            &request.method,
            &request.path,
            &request.body,
            provided,
        );
        if !valid {
            debug!(path = %request.path, "rejected request signature");
            return Ok(Verdict::Unauthorized(REASON_INVALID_SIGNATURE));
        }

        Ok(Verdict::Authorized)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::SecretResolver;

    const SECRET: &str = "topsecret";
    const NOW: u64 = 1_700_000_000;

    struct Fixed;

    #[async_trait]
    impl SecretResolver for Fixed {
        async fn resolve(&self, _name: &str, _required: bool) -> Result<Option<String>> {
            Ok(Some(SECRET.to_string()))
        }
    }

    fn verifier() -> RequestVerifier {
        RequestVerifier::new(Arc::new(SecretStore::new(Arc::new(Fixed))), "HMAC")
            .with_public_paths(["/health"])
    }

    fn signed(ts: u64, method: &str, path: &str, body: &[u8]) -> SignedRequest {
        let ts = ts.to_string();
        let sig = signature::sign(SECRET, &ts, method, path, body);
        SignedRequest::new(method, path, body.to_vec())
            .with_signature(sig)
            .with_timestamp(ts)
    }

    #[tokio::test]
    async fn accepts_valid_signature() {
        let request = signed(NOW, "POST", "/tools/generate", b"{\"prompt\":\"cat\"}");
        let verdict = verifier().verify_at(&request, NOW).await.unwrap();
        assert_eq!(verdict, Verdict::Authorized);
    }

    #[tokio::test]
    async fn rejects_any_single_byte_mutation() {
        let verifier = verifier();
        let original = signed(NOW, "POST", "/tools/generate", b"payload");

        let mut sig = original.signature.clone().unwrap().into_bytes();
        sig[0] = if sig[0] == b'0' { b'1' } else { b'0' };
        let mutated_sig = original
            .clone()
            .with_signature(String::from_utf8(sig).unwrap());

        let mutated_ts = original.clone().with_timestamp((NOW + 1).to_string());
        let mut mutated_method = original.clone();
        mutated_method.method = "PUT".into();
        let mut mutated_path = original.clone();
        mutated_path.path = "/tools/generatf".into();
        let mut mutated_body = original.clone();
        mutated_body.body = Bytes::from_static(b"paylaod");

        for request in [mutated_sig, mutated_ts, mutated_method, mutated_path, mutated_body] {
            let verdict = verifier.verify_at(&request, NOW).await.unwrap();
            assert_eq!(verdict, Verdict::Unauthorized(REASON_INVALID_SIGNATURE));
        }
    }

    #[tokio::test]
    async fn rejects_stale_and_future_timestamps() {
        let verifier = verifier();
        for ts in [NOW - 301, NOW + 301] {
            let request = signed(ts, "GET", "/tools", b"");
            let verdict = verifier.verify_at(&request, NOW).await.unwrap();
            assert_eq!(verdict, Verdict::Unauthorized(REASON_TIMESTAMP_EXPIRED));
        }

        let edge = signed(NOW - 300, "GET", "/tools", b"");
        assert!(verifier.verify_at(&edge, NOW).await.unwrap().is_authorized());
    }

    #[tokio::test]
    async fn missing_headers() {
        let verifier = verifier();
        let bare = SignedRequest::new("GET", "/tools", Bytes::new());
        assert_eq!(
            verifier.verify_at(&bare, NOW).await.unwrap(),
            Verdict::Unauthorized(REASON_MISSING_HEADERS)
        );

        let only_sig = bare.clone().with_signature("00");
        assert_eq!(
            verifier.verify_at(&only_sig, NOW).await.unwrap(),
            Verdict::Unauthorized(REASON_MISSING_HEADERS)
        );

        let bad_ts = bare.with_signature("00").with_timestamp("yesterday");
        assert_eq!(
            verifier.verify_at(&bad_ts, NOW).await.unwrap(),
            Verdict::Unauthorized(REASON_MISSING_HEADERS)
        );
    }

    #[tokio::test]
    async fn public_path_needs_no_headers() {
        let request = SignedRequest::new("GET", "/health", Bytes::new());
        assert!(verifier().verify_at(&request, NOW).await.unwrap().is_authorized());
    }

    #[tokio::test]
    async fn non_hex_signature_is_invalid() {
        let request = SignedRequest::new("GET", "/tools", Bytes::new())
            .with_signature("zz")
            .with_timestamp(NOW.to_string());
        assert_eq!(
            verifier().verify_at(&request, NOW).await.unwrap(),
            Verdict::Unauthorized(REASON_INVALID_SIGNATURE)
        );
    }
}
