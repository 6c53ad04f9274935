//! Integration tests for the webhook relay
//!
//! Each test posts a GitLab webhook through the full router and checks
//! what reached the stand-in Telegram Bot API and what GitLab was told.

mod common;

use axum::http::StatusCode;
use common::{
    mount_send_message, router_for, send, sent_messages, telegram_ok, test_config,
    webhook_request, DEFAULT_CHAT_ID,
};
use serde_json::{json, Value};
use wiremock::MockServer;

fn merge_request_opened() -> Value {
    json!({
        "object_kind": "merge_request",
        "user": { "name": "an.le", "username": "anle" },
        "project": { "name": "Foxy.Bot", "web_url": "https://gitlab.com/foxy/bot" },
        "object_attributes": {
            "action": "open",
            "iid": 12,
            "title": "Add retry",
            "description": "Retries failed sends.",
            "url": "https://gitlab.com/foxy/bot/-/merge_requests/12"
        }
    })
}

fn pipeline(status: &str) -> Value {
    json!({
        "object_kind": "pipeline",
        "user": { "name": "an.le" },
        "project": { "name": "Foxy.Bot", "web_url": "https://gitlab.com/foxy/bot" },
        "object_attributes": { "id": 31, "status": status, "ref": "main", "duration": 90 }
    })
}

// ============================================================================
// Delivery
// ============================================================================

#[tokio::test]
async fn test_merge_request_is_delivered_to_default_chat() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;
    let router = router_for(test_config(&telegram));

    let (status, body) = send(
        router,
        webhook_request("/api", Some("Merge Request Hook"), None, &merge_request_opened()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let relayed: Value = serde_json::from_slice(&body).expect("JSON body");
    assert_eq!(relayed, telegram_ok());

    let sent = sent_messages(&telegram).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], DEFAULT_CHAT_ID);
    assert_eq!(sent[0]["parse_mode"], "MarkdownV2");
    assert_eq!(sent[0]["disable_web_page_preview"], true);

    let text = sent[0]["text"].as_str().expect("text");
    assert_eq!(
        text,
        "🆕 *an\\.le* opened merge request \
         [\\!12 Add retry](https://gitlab.com/foxy/bot/-/merge_requests/12) \
         in [Foxy\\.Bot](https://gitlab.com/foxy/bot)\n\nRetries failed sends\\."
    );
}

#[tokio::test]
async fn test_failed_pipeline_is_delivered() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;
    let router = router_for(test_config(&telegram));

    let (status, _) = send(
        router,
        webhook_request("/api", Some("Pipeline Hook"), None, &pipeline("failed")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = sent_messages(&telegram).await;
    assert_eq!(sent.len(), 1);
    let text = sent[0]["text"].as_str().expect("text");
    assert!(text.starts_with("❌ Pipeline"));
    assert!(text.contains("[\\#31](https://gitlab.com/foxy/bot/-/pipelines/31)"));
    assert!(text.ends_with("failed after 1m 30s"));
}

#[tokio::test]
async fn test_overview_comment_and_opened_issue_are_delivered() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;

    let comment = json!({
        "user": { "name": "Bao Tran" },
        "project": { "name": "Foxy.Bot", "web_url": "https://gitlab.com/foxy/bot" },
        "object_attributes": { "note": "LGTM!", "noteable_type": "MergeRequest", "type": null },
        "merge_request": { "iid": 4, "title": "Retry", "url": "https://gitlab.com/foxy/bot/-/merge_requests/4" }
    });
    let issue = json!({
        "user": { "name": "Bao Tran" },
        "project": { "name": "Foxy.Bot", "web_url": "https://gitlab.com/foxy/bot" },
        "object_attributes": {
            "action": "open",
            "iid": 9,
            "title": "Crash on start",
            "url": "https://gitlab.com/foxy/bot/-/issues/9"
        }
    });

    let config = test_config(&telegram);
    send(
        router_for(config.clone()),
        webhook_request("/api", Some("Note Hook"), None, &comment),
    )
    .await;
    send(
        router_for(config),
        webhook_request("/api", Some("Issue Hook"), None, &issue),
    )
    .await;

    let sent = sent_messages(&telegram).await;
    assert_eq!(sent.len(), 2);
    let comment_text = sent[0]["text"].as_str().expect("text");
    assert!(comment_text.starts_with("💬 *Bao Tran* commented on merge request"));
    assert!(comment_text.ends_with("LGTM\\!"));
    let issue_text = sent[1]["text"].as_str().expect("text");
    assert!(issue_text.starts_with("🐛 *Bao Tran* opened issue [\\#9 Crash on start]"));
}

// ============================================================================
// Events That Are Not Announced
// ============================================================================

#[tokio::test]
async fn test_unannounced_events_are_acknowledged_without_delivery() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;
    let config = test_config(&telegram);

    let requests = [
        webhook_request("/api", Some("Push Hook"), None, &json!({ "ref": "refs/heads/main" })),
        webhook_request("/api", Some("Pipeline Hook"), None, &pipeline("pending")),
        webhook_request("/api", None, None, &merge_request_opened()),
        webhook_request(
            "/api",
            Some("Note Hook"),
            None,
            &json!({ "object_attributes": { "noteable_type": "MergeRequest", "type": "DiffNote" } }),
        ),
    ];

    for request in requests {
        let (status, body) = send(router_for(config.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    assert!(sent_messages(&telegram).await.is_empty());
}

// ============================================================================
// Authentication and Chat Selection
// ============================================================================

#[tokio::test]
async fn test_wrong_secret_token_is_rejected_before_delivery() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;
    let mut config = test_config(&telegram);
    config.webhook.secret_token = Some("s3cret".to_string());

    let (status, body) = send(
        router_for(config.clone()),
        webhook_request("/api", Some("Pipeline Hook"), Some("wrong"), &pipeline("failed")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).expect("JSON body");
    assert_eq!(body, json!({ "message": "Unauthorized Gitlab Token" }));
    assert!(sent_messages(&telegram).await.is_empty());

    let (status, _) = send(
        router_for(config),
        webhook_request("/api", Some("Pipeline Hook"), Some("s3cret"), &pipeline("failed")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent_messages(&telegram).await.len(), 1);
}

#[tokio::test]
async fn test_chat_id_query_parameter_overrides_default() {
    let telegram = MockServer::start().await;
    mount_send_message(&telegram, 200, telegram_ok()).await;

    send(
        router_for(test_config(&telegram)),
        webhook_request("/api?chat_id=-42", Some("Pipeline Hook"), None, &pipeline("success")),
    )
    .await;

    let sent = sent_messages(&telegram).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], "-42");
}

#[tokio::test]
async fn test_missing_chat_id_is_bad_request() {
    let telegram = MockServer::start().await;
    let mut config = test_config(&telegram);
    config.telegram.default_chat_id = None;

    let (status, _) = send(
        router_for(config),
        webhook_request("/api", Some("Pipeline Hook"), None, &pipeline("failed")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(sent_messages(&telegram).await.is_empty());
}

// ============================================================================
// Upstream Failures
// ============================================================================

#[tokio::test]
async fn test_telegram_error_is_relayed_verbatim() {
    let telegram = MockServer::start().await;
    let rejection = json!({
        "ok": false,
        "error_code": 400,
        "description": "Bad Request: can't parse entities"
    });
    mount_send_message(&telegram, 400, rejection.clone()).await;

    let (status, body) = send(
        router_for(test_config(&telegram)),
        webhook_request("/api", Some("Pipeline Hook"), None, &pipeline("failed")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).expect("JSON body");
    assert_eq!(body, rejection);
}

#[tokio::test]
async fn test_non_json_upstream_body_is_bad_gateway() {
    let telegram = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"),
        )
        .mount(&telegram)
        .await;

    let (status, body) = send(
        router_for(test_config(&telegram)),
        webhook_request("/api", Some("Pipeline Hook"), None, &pipeline("failed")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_slice(&body).expect("JSON body");
    assert_eq!(body["status"], 502);
    assert!(body["error"].as_str().is_some());
}
