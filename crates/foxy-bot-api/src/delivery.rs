//! Outbound delivery of notifications through the Telegram Bot API.
//!
//! The client performs exactly one `sendMessage` call per notification and
//! never retries: GitLab redelivers webhooks that are not acknowledged in
//! time, which is the only recovery mechanism.

use crate::config::TelegramConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Telegram parse mode used for every message.
pub const PARSE_MODE: &str = "MarkdownV2";

/// Body of a Bot API `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub parse_mode: String,
    pub disable_web_page_preview: bool,
    pub text: String,
}

impl SendMessageRequest {
    /// A MarkdownV2 message with link previews disabled.
    pub fn markdown(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            parse_mode: PARSE_MODE.to_string(),
            disable_web_page_preview: true,
            text: text.into(),
        }
    }
}

/// Status and JSON body returned by the Bot API, relayed verbatim to GitLab.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: Value,
}

impl DeliveryResponse {
    /// Returns `true` for a 2xx upstream status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Interface for sending a rendered notification to a chat.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    /// Send one message. Upstream error statuses are returned as a
    /// [`DeliveryResponse`], not as an error.
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<DeliveryResponse, DeliveryError>;
}

/// Failures that leave no upstream response to relay.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid delivery configuration: {message}")]
    Configuration { message: String },

    #[error("Telegram API request timed out")]
    Timeout,

    #[error("Telegram API request failed: {message}")]
    Transport { message: String },

    #[error("Telegram API returned a non-JSON body with status {status}: {message}")]
    InvalidResponse { status: u16, message: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        // The request URL embeds the bot token.
        Self::Transport {
            message: e.without_url().to_string(),
        }
    }
}

// ============================================================================
// Telegram Client
// ============================================================================

/// [`ChatDelivery`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base_url: Url,
    bot_token: String,
}

impl TelegramClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Configuration`] for an unusable base URL or
    /// when the HTTP client cannot be created.
    pub fn new(config: &TelegramConfig) -> Result<Self, DeliveryError> {
        let api_base_url =
            Url::parse(&config.api_base_url).map_err(|e| DeliveryError::Configuration {
                message: format!("invalid api_base_url '{}': {}", config.api_base_url, e),
            })?;

        if api_base_url.cannot_be_a_base() {
            return Err(DeliveryError::Configuration {
                message: format!("api_base_url '{}' cannot be a base URL", api_base_url),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("foxy-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_base_url,
            bot_token: config.bot_token.clone(),
        })
    }

    /// `{api_base_url}/bot{token}/sendMessage`
    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url.as_str().trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("bot_token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl ChatDelivery for TelegramClient {
    #[instrument(
        skip(self, request),
        fields(chat_id = %request.chat_id, text_len = request.text.len())
    )]
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let response = self
            .http_client
            .post(self.send_message_url())
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| DeliveryError::InvalidResponse {
                status,
                message: e.to_string(),
            })?;

        debug!(status, "Telegram API responded");
        Ok(DeliveryResponse { status, body })
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
