//! Error types for the HTTP service

use crate::delivery::DeliveryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

/// Body returned to GitLab when the `X-Gitlab-Token` check fails.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized Gitlab Token";

/// Webhook handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: the request names no destination chat
/// - `401 Unauthorized`: the shared secret does not match
/// - `502 Bad Gateway`: the Telegram Bot API could not be reached or
///   answered with something other than JSON
///
/// Upstream Telegram errors that arrive as JSON are not errors here: their
/// status and body are relayed to GitLab unchanged.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// `X-Gitlab-Token` is missing or wrong
    ///
    /// Maps to: `401 Unauthorized` with `{"message": "Unauthorized Gitlab Token"}`
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// Neither the query string nor the configuration names a chat
    ///
    /// Maps to: `400 Bad Request` (permanent error, do not retry)
    #[error("No destination chat: pass '{query_param}' or configure a default chat id")]
    MissingChatId { query_param: String },

    /// Telegram delivery failed before an upstream response was available
    ///
    /// Maps to: `502 Bad Gateway`
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => {
                warn!("Rejected webhook with invalid X-Gitlab-Token");
                let body = serde_json::json!({ "message": UNAUTHORIZED_MESSAGE });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            Self::MissingChatId { .. } => {
                warn!(error = %self, "Rejected webhook without destination chat");
                StatusCode::BAD_REQUEST
            }
            Self::Delivery(ref e) => {
                error!(error = %e, "Telegram delivery failed");
                StatusCode::BAD_GATEWAY
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Delivery client error: {0}")]
    Delivery(#[from] DeliveryError),
}

impl ServiceError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
            Self::Delivery(_) => 4,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] ::config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
