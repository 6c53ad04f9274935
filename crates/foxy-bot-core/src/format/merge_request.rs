//! Merge request notifications.

use super::{headline, with_project, with_subject};
use crate::events::{non_blank, MergeRequestAction, MergeRequestEvent};
use crate::markdown::{Line, MessageBuilder};
use crate::Notification;
use tracing::debug;

impl MergeRequestAction {
    /// Headline marker and verb for the action.
    pub fn presentation(self) -> (&'static str, &'static str) {
        match self {
            Self::Open => ("🆕", "opened"),
            Self::Update => ("🆙", "updated"),
            Self::Reopen => ("🔃", "reopened"),
            Self::Approved => ("🆗", "approved"),
            Self::Merge => ("🆒", "merged"),
            Self::Close => ("🚮", "closed"),
        }
    }
}

/// Render a `Merge Request Hook` payload.
///
/// `open` carries the description as a body, `update` the description and the
/// last commit message. Other recognised actions render a single headline;
/// unrecognised ones render nothing.
pub fn format_merge_request(event: &MergeRequestEvent) -> Notification {
    let attributes = &event.object_attributes;
    let Some(action) = attributes
        .action
        .as_deref()
        .and_then(MergeRequestAction::from_key)
    else {
        debug!(
            action = ?attributes.action,
            "Merge request action does not produce a notification"
        );
        return Notification::Empty;
    };

    let (emoji, verb) = action.presentation();
    let line = headline(emoji, &event.user, verb);
    let line = with_subject(
        line,
        "merge request",
        '!',
        attributes.iid,
        attributes.title.as_deref(),
        attributes.url.as_deref(),
    );
    let message = MessageBuilder::new(with_project(line, &event.project));

    let message = match action {
        MergeRequestAction::Open => message.paragraph(attributes.description.as_deref()),
        MergeRequestAction::Update => {
            let last_commit = match non_blank(attributes.last_commit.message.as_deref()) {
                Some(commit) => Line::new()
                    .bold("Last commit:")
                    .text(" ")
                    .text(commit.trim_end()),
                None => Line::new(),
            };
            message
                .paragraph(attributes.description.as_deref())
                .block(last_commit)
        }
        _ => message,
    };

    message.build()
}

#[cfg(test)]
#[path = "merge_request_tests.rs"]
mod tests;
