use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::ImageGenError;

impl ImageGenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ImageGenError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ImageGenError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ImageGenError::ToolNotRegistered(_) => StatusCode::NOT_FOUND,
            ImageGenError::ContentModerated { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ImageGenError::ProviderSubmitError { .. }
            | ImageGenError::ProviderPollError { .. }
            | ImageGenError::JobFailed { .. }
            | ImageGenError::MissingArtifact { .. }
            | ImageGenError::Http(_) => StatusCode::BAD_GATEWAY,
            ImageGenError::JobTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ImageGenError::MissingConfiguration(_)
            | ImageGenError::Serialization(_)
            | ImageGenError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ImageGenError::Unauthorized(_) => "unauthorized",
            ImageGenError::InvalidInput(_) => "invalid_request",
            ImageGenError::ToolNotRegistered(_) => "unknown_tool",
            ImageGenError::ContentModerated { .. } => "content_moderated",
            ImageGenError::ProviderSubmitError { .. } | ImageGenError::ProviderPollError { .. } => {
                "provider_error"
            }
            ImageGenError::JobFailed { .. } => "job_failed",
            ImageGenError::MissingArtifact { .. } => "missing_artifact",
            ImageGenError::JobTimeout { .. } => "job_timeout",
            ImageGenError::Http(_) => "upstream_error",
            ImageGenError::MissingConfiguration(_)
            | ImageGenError::Serialization(_)
            | ImageGenError::Other(_) => "internal_error",
        }
    }
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ImageGenError::Unauthorized(reason) = &self {
            let body = Json(json!({
                "error": "unauthorized",
                "error_description": reason,
            }));
            let mut response = (status, body).into_response();
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("HMAC"));
            return response;
        }

        if self.is_job_failure() {
            tracing::warn!(error = %self, "tool job did not produce an artifact");
        } else if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        // 响应中不暴露配置项名称
        let description = match &self {
            ImageGenError::MissingConfiguration(_) | ImageGenError::Other(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": self.error_code(),
            "error_description": description,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ImageGenError::Unauthorized("missing headers".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "HMAC"
        );
    }

    #[test]
    fn moderation_and_failure_map_differently() {
        let moderated = ImageGenError::ContentModerated {
            job_id: "a".into(),
            status: "Content Moderated".into(),
        };
        let failed = ImageGenError::JobFailed {
            job_id: "a".into(),
            status: "Error".into(),
        };
        assert_eq!(moderated.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(failed.status_code(), StatusCode::BAD_GATEWAY);
    }
}
