//! Shared-secret verification of inbound webhooks.
//!
//! GitLab sends the secret token configured on the webhook verbatim in the
//! `X-Gitlab-Token` header; there is no payload signature to check.

use crate::errors::WebhookHandlerError;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Header carrying the webhook's secret token.
pub const GITLAB_TOKEN_HEADER: &str = "x-gitlab-token";

/// Header naming the event type, e.g. `Pipeline Hook`.
pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";

/// Check `X-Gitlab-Token` against the configured secret.
///
/// Without a configured secret every request is accepted. The comparison is
/// constant-time in the length of the provided token.
pub fn verify_gitlab_token(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), WebhookHandlerError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers
        .get(GITLAB_TOKEN_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if bool::from(provided.ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(WebhookHandlerError::Unauthorized)
    }
}

/// Value of `X-Gitlab-Event`, or `""` when absent or not valid text.
pub fn gitlab_event_label(headers: &HeaderMap) -> &str {
    headers
        .get(GITLAB_EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
