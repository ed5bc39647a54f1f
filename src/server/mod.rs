//! HTTP 服务：工具路由统一挂在签名中间件之后

pub mod response;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::auth::{require_signature, RequestVerifier};
use crate::config::{EnvResolver, ServiceConfig};
use crate::error::{ImageGenError, Result};
use crate::secrets::SecretStore;
use crate::tools::{register_builtin_tools, ToolContext, ToolInvocation, ToolOutput, ToolRegistry};

pub const HEALTH_PATH: &str = "/health";
pub const TOOLS_PATH: &str = "/tools";
pub const TOOL_PATH: &str = "/tools/{name}";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub secrets: Arc<SecretStore>,
    pub verifier: RequestVerifier,
}

impl AppState {
    pub fn new(registry: ToolRegistry, secrets: Arc<SecretStore>, hmac_secret_name: &str) -> Self {
        let verifier = RequestVerifier::new(Arc::clone(&secrets), hmac_secret_name)
            .with_public_paths([HEALTH_PATH]);
        Self {
            registry: Arc::new(registry),
            secrets,
            verifier,
        }
    }

    /// 根据配置构建状态，密钥从进程环境变量解析
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry, config)?;
        let secrets = Arc::new(SecretStore::new(Arc::new(EnvResolver::new())));
        Ok(Self::new(registry, secrets, &config.hmac_secret_name))
    }
}

pub fn router(state: AppState) -> Router {
    let verifier = state.verifier.clone();
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(TOOLS_PATH, get(list_tools))
        .route(TOOL_PATH, post(invoke_tool))
        .layer(middleware::from_fn_with_state(verifier, require_signature))
        .with_state(state)
}

pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let tools: Vec<String> = state
        .registry
        .descriptors()
        .into_iter()
        .map(|d| d.name)
        .collect();

    let listener = TcpListener::bind(&config.bind).await?;
    tracing::info!(addr = %config.bind, ?tools, "imagegen server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.descriptors())
}

async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<Value>,
) -> std::result::Result<Json<ToolOutput>, ImageGenError> {
    // 请求 future 被丢弃时取消正在等待的任务
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let ctx = ToolContext::new(Arc::clone(&state.secrets)).with_cancellation(cancel);
    let output = state
        .registry
        .invoke(ToolInvocation::new(name, input), &ctx)
        .await?;
    Ok(Json(output))
}
