//! # Dispatch Pipeline
//!
//! The single entry point the HTTP layer calls for every webhook delivery.
//!
//! ```text
//! label ──► WebhookEvent::parse ──► formatter ──► Notification
//!               │ Unknown / unreadable
//!               └──────────► Empty
//! ```

use crate::events::{PayloadError, WebhookEvent};
use crate::format::{DefaultFormatter, NotificationFormatter};
use crate::Notification;
use serde_json::Value;
use tracing::{debug, warn};

/// Build the notification for one webhook delivery with the default formatters.
///
/// Never fails. Unhandled event types, excluded sub-cases and payloads that
/// cannot be read all resolve to [`Notification::Empty`], so the sender always
/// receives a successful acknowledgement.
///
/// # Examples
///
/// ```rust
/// use foxy_bot_core::build_notification;
/// use serde_json::json;
///
/// let payload = json!({ "object_attributes": { "status": "pending" } });
/// assert!(build_notification("Pipeline Hook", &payload).is_empty());
/// ```
pub fn build_notification(label: &str, payload: &Value) -> Notification {
    build_notification_with(&DefaultFormatter, label, payload)
}

/// Build the notification for one webhook delivery with `formatter`.
///
/// The payload is only inspected, and the formatter only invoked, for event
/// types the relay handles.
pub fn build_notification_with(
    formatter: &dyn NotificationFormatter,
    label: &str,
    payload: &Value,
) -> Notification {
    let event = match WebhookEvent::parse(label, payload) {
        Ok(event) => event,
        Err(PayloadError::UnsupportedEvent) => {
            debug!(event_type = %label, "Event type is not relayed");
            return Notification::Empty;
        }
        Err(e) => {
            warn!(
                event_type = %label,
                error = %e,
                "Webhook payload could not be read"
            );
            return Notification::Empty;
        }
    };

    let notification = formatter.format(&event.payload);
    debug!(
        category = %event.category,
        skipped = notification.is_empty(),
        "Webhook event formatted"
    );
    notification
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
