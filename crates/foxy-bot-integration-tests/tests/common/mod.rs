//! Common test utilities for foxy-bot integration tests
//!
//! The router under test is wired to a real [`TelegramClient`] whose base
//! URL points at a wiremock server standing in for the Bot API.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use foxy_bot_api::{create_router, AppState, ServiceConfig, TelegramClient};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const BOT_TOKEN: &str = "123456:TEST-TOKEN";
pub const SEND_MESSAGE_PATH: &str = "/bot123456:TEST-TOKEN/sendMessage";
pub const DEFAULT_CHAT_ID: &str = "-1001";

/// Configuration pointing at `telegram`, with a default chat and no secret.
pub fn test_config(telegram: &MockServer) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.telegram.api_base_url = telegram.uri();
    config.telegram.bot_token = BOT_TOKEN.to_string();
    config.telegram.default_chat_id = Some(DEFAULT_CHAT_ID.to_string());
    config.telegram.timeout_seconds = 2;
    config
}

/// Router backed by a real Telegram client.
pub fn router_for(config: ServiceConfig) -> Router {
    let client = TelegramClient::new(&config.telegram).expect("valid telegram config");
    create_router(AppState::new(config, Arc::new(client)))
}

/// Mount a `sendMessage` mock that answers with `status` and `body`.
pub async fn mount_send_message(telegram: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(SEND_MESSAGE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(telegram)
        .await;
}

/// Telegram's reply to a successful `sendMessage`.
pub fn telegram_ok() -> Value {
    serde_json::json!({ "ok": true, "result": { "message_id": 7 } })
}

/// Build a webhook POST for `uri` with the given event header and payload.
pub fn webhook_request(
    uri: &str,
    event: Option<&str>,
    token: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(event) = event {
        builder = builder.header("x-gitlab-event", event);
    }
    if let Some(token) = token {
        builder = builder.header("x-gitlab-token", token);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Send `request` through `router` and return the status and raw body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    (status, body.to_vec())
}

/// Bodies of every `sendMessage` call the mock server received.
pub async fn sent_messages(telegram: &MockServer) -> Vec<Value> {
    telegram
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("JSON request body"))
        .collect()
}
