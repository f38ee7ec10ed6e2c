//! HTTP surface: webhook endpoint, health check and a static status page.

use std::future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::RelayConfig;
use crate::dispatch::{Dispatcher, WebhookReply};
use crate::error::RelayError;
use crate::telegram::Update;

pub const VERSION: &str = "1.0";

const STATUS_PAGE: &str = r#"<!doctype html>
<html lang="ru">
<head><meta charset="utf-8"><title>Telegram Bot</title></head>
<body>
    <h1>Telegram Bot</h1>
    <p>Сервер работает корректно!</p>
    <ul>
        <li><a href="/health">Health Check</a></li>
        <li>Webhook: POST /webhook</li>
    </ul>
</body>
</html>
"#;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(config)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .route("/", get(status_page))
        .route("/test", get(status_page))
        .with_state(state)
}

/// Binds the listener and serves until Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: RelayConfig) -> Result<(), RelayError> {
    let state = AppState::new(&config);
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: config.listen_addr,
            source,
        })?;

    info!(
        addr = %config.listen_addr,
        model = %config.recognition.model,
        normalize = config.normalize.enabled,
        "scanrelay listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RelayError::Serve)?;

    info!("scanrelay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Always answers 200. Payloads that are not a valid update get an error
/// status in the body instead of a rejection.
async fn webhook(State(state): State<AppState>, body: Bytes) -> Json<WebhookReply> {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(err) => {
            error!(error = %err, bytes = body.len(), "malformed webhook payload");
            return Json(WebhookReply::error(format!("invalid update: {err}")));
        }
    };
    Json(state.dispatcher.handle_update(update).await)
}

async fn health() -> Json<HealthReport> {
    Json(HealthReport {
        status: "running",
        message: "🚀 Telegram Bot is running!",
        version: VERSION,
    })
}

async fn status_page() -> Html<&'static str> {
    Html(STATUS_PAGE)
}
