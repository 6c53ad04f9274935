//! Comment notifications.
//!
//! Only overview comments on merge requests are announced. Diff and
//! discussion notes arrive in bursts during a review and would flood the
//! chat; comments on issues, snippets and commits are not relayed.

use super::{headline, with_project, with_subject};
use crate::events::{non_blank, NoteEvent, NoteableType};
use crate::markdown::MessageBuilder;
use crate::Notification;
use tracing::debug;

/// Render a `Note Hook` payload.
pub fn format_comment(event: &NoteEvent) -> Notification {
    let note = &event.object_attributes;
    let noteable = note.noteable_type.as_deref().and_then(NoteableType::from_key);

    if noteable != Some(NoteableType::MergeRequest) || !note.is_overview_comment() {
        debug!(
            noteable_type = ?note.noteable_type,
            note_type = ?note.note_type,
            "Comment does not produce a notification"
        );
        return Notification::Empty;
    }

    let merge_request = &event.merge_request;
    let url = non_blank(merge_request.url.as_deref()).or(non_blank(note.url.as_deref()));

    let line = headline("💬", &event.user, "commented on");
    let line = with_subject(
        line,
        "merge request",
        '!',
        merge_request.iid,
        merge_request.title.as_deref(),
        url,
    );

    MessageBuilder::new(with_project(line, &event.project))
        .paragraph(note.note.as_deref())
        .build()
}

#[cfg(test)]
#[path = "comment_tests.rs"]
mod tests;
