//! Issue notifications.

use super::{headline, with_project, with_subject};
use crate::events::{IssueAction, IssueEvent};
use crate::markdown::MessageBuilder;
use crate::Notification;
use tracing::debug;

/// Render an `Issue Hook` payload.
///
/// Opening an issue announces it with its description; closing it announces
/// the headline only. Edits are not relayed.
pub fn format_issue(event: &IssueEvent) -> Notification {
    let attributes = &event.object_attributes;
    let action = attributes.action.as_deref().and_then(IssueAction::from_key);

    let (emoji, verb) = match action {
        Some(IssueAction::Open) => ("🐛", "opened"),
        Some(IssueAction::Close) => ("🔒", "closed"),
        Some(IssueAction::Update) | None => {
            debug!(
                action = ?attributes.action,
                "Issue action does not produce a notification"
            );
            return Notification::Empty;
        }
    };

    let line = headline(emoji, &event.user, verb);
    let line = with_subject(
        line,
        "issue",
        '#',
        attributes.iid,
        attributes.title.as_deref(),
        attributes.url.as_deref(),
    );
    let message = MessageBuilder::new(with_project(line, &event.project));

    let message = if action == Some(IssueAction::Open) {
        message.paragraph(attributes.description.as_deref())
    } else {
        message
    };

    message.build()
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
