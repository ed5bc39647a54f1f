//! 签名校验中间件：受保护路由统一经过 [`RequestVerifier`]
//!
//! 请求体会被完整缓冲，签名覆盖的正是收到的原始字节；
//! 校验通过后用同一份字节重建请求交给下游处理器。

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::verifier::{RequestVerifier, SignedRequest, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::{ImageGenError, Result};

/// 请求体缓冲上限
pub const MAX_SIGNED_BODY_BYTES: usize = 16 * 1024 * 1024;

pub async fn require_signature(
    State(verifier): State<RequestVerifier>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if verifier.is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|e| ImageGenError::InvalidInput(format!("failed to read request body: {e}")))?;

    let signed = SignedRequest {
        signature: header_value(&parts.headers, SIGNATURE_HEADER),
        timestamp: header_value(&parts.headers, TIMESTAMP_HEADER),
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        body: body.clone(),
    };

    verifier.verify(&signed).await?.into_result().inspect_err(|_| {
        tracing::warn!(method = %signed.method, path = %signed.path, "rejected unauthenticated request");
    })?;

    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}
