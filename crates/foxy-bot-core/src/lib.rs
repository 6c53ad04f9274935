//! # Foxy-Bot Core
//!
//! Event classification and message formatting for relaying GitLab webhooks
//! into Telegram chats.
//!
//! Given the value of the `X-Gitlab-Event` header and the JSON body of a
//! webhook delivery, the core decides whether the event deserves a chat
//! notification and, if so, produces the exact MarkdownV2 text to send.
//!
//! ## Architecture
//!
//! The core is a pure, synchronous computation:
//! - No I/O, no configuration, no shared state between invocations
//! - Every degenerate input resolves to [`Notification::Empty`] instead of an error
//! - Human-authored text is escaped by construction through [`markdown::Line`]
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`markdown`] | MarkdownV2 escaping and the line builder |
//! | [`duration`] | Pipeline duration rendering |
//! | [`events`] | Event classifier and typed payloads |
//! | [`format`] | Per-category formatters |
//! | [`dispatch`] | The single entry point used by the HTTP layer |
//!
//! ## Usage
//!
//! ```rust
//! use foxy_bot_core::{build_notification, Notification};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "user": { "name": "an.le" },
//!     "project": { "name": "Foxy.Bot", "web_url": "https://gitlab.com/foxy/bot" },
//!     "object_attributes": { "id": 7, "status": "failed", "duration": 90, "ref": "main" }
//! });
//!
//! let notification = build_notification("Pipeline Hook", &payload);
//! assert!(notification.as_text().unwrap().contains("1m 30s"));
//!
//! assert_eq!(build_notification("Push Hook", &payload), Notification::Empty);
//! ```

use std::fmt;

pub mod dispatch;
pub mod duration;
pub mod events;
pub mod format;
pub mod markdown;

// Re-export key types for convenience
pub use dispatch::{build_notification, build_notification_with};
pub use duration::format_duration;
pub use events::{EventCategory, EventPayload, PayloadError, WebhookEvent};
pub use format::{DefaultFormatter, NotificationFormatter};
pub use markdown::{escape_markdown, sanitize, Line, MessageBuilder};

// ============================================================================
// Notification
// ============================================================================

/// Outcome of formatting one webhook delivery.
///
/// `Empty` means "send nothing"; the HTTP layer acknowledges the webhook
/// without calling Telegram. `Text` always holds a non-empty, fully escaped
/// MarkdownV2 message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Notification {
    /// Nothing to deliver for this event.
    #[default]
    Empty,

    /// Ready-to-send MarkdownV2 message body.
    Text(String),
}

impl Notification {
    /// Wrap rendered text, collapsing an empty string into [`Notification::Empty`].
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        if content.is_empty() {
            Self::Empty
        } else {
            Self::Text(content)
        }
    }

    /// Returns `true` when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Borrow the message body, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text().unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
