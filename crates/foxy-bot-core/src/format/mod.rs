//! # Notification Formatters
//!
//! One formatter per event category. Each inspects its category's sub-case
//! discriminator and either renders a message or returns
//! [`Notification::Empty`] for sub-cases that are not announced.
//!
//! Every headline follows the same shape:
//!
//! ```text
//! <emoji> *<actor>* <verb> <noun> [<reference> <title>](<url>) in [<project>](<project url>)
//! ```
//!
//! followed by optional paragraphs of escaped free text.

use crate::events::{
    non_blank, Actor, EventPayload, IssueEvent, MergeRequestEvent, NoteEvent, PipelineEvent,
    Project,
};
use crate::markdown::Line;
use crate::Notification;

pub mod comment;
pub mod issue;
pub mod merge_request;
pub mod pipeline;

// ============================================================================
// Formatter Interface
// ============================================================================

/// Interface for rendering typed payloads into notifications.
///
/// The dispatch pipeline is written against this trait so that tests can
/// observe which formatter, if any, handled an event.
pub trait NotificationFormatter: Send + Sync {
    /// Render a merge request event
    fn merge_request(&self, event: &MergeRequestEvent) -> Notification;

    /// Render a pipeline event
    fn pipeline(&self, event: &PipelineEvent) -> Notification;

    /// Render a comment event
    fn comment(&self, event: &NoteEvent) -> Notification;

    /// Render an issue event
    fn issue(&self, event: &IssueEvent) -> Notification;

    /// Route a payload to the formatter for its variant.
    fn format(&self, payload: &EventPayload) -> Notification {
        match payload {
            EventPayload::MergeRequest(event) => self.merge_request(event),
            EventPayload::Pipeline(event) => self.pipeline(event),
            EventPayload::Comment(event) => self.comment(event),
            EventPayload::Issue(event) => self.issue(event),
        }
    }
}

/// The production formatter set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl NotificationFormatter for DefaultFormatter {
    fn merge_request(&self, event: &MergeRequestEvent) -> Notification {
        merge_request::format_merge_request(event)
    }

    fn pipeline(&self, event: &PipelineEvent) -> Notification {
        pipeline::format_pipeline(event)
    }

    fn comment(&self, event: &NoteEvent) -> Notification {
        comment::format_comment(event)
    }

    fn issue(&self, event: &IssueEvent) -> Notification {
        issue::format_issue(event)
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// `<emoji> *<actor>* <verb>`
pub(crate) fn headline(emoji: &'static str, actor: &Actor, verb: &str) -> Line {
    Line::new()
        .emoji(emoji)
        .bold(actor.display_name())
        .text(" ")
        .text(verb)
}

/// Append ` <noun> [<sigil><iid> <title>](<url>)`.
///
/// Missing parts are dropped; with neither reference, title nor URL only the
/// noun is appended.
pub(crate) fn with_subject(
    line: Line,
    noun: &str,
    sigil: char,
    iid: Option<u64>,
    title: Option<&str>,
    url: Option<&str>,
) -> Line {
    let mut label = Line::new().reference(sigil, iid);
    if let Some(title) = non_blank(title) {
        if !label.is_empty() {
            label = label.text(" ");
        }
        label = label.text(title);
    }

    let subject = Line::new().link(label, non_blank(url));
    let line = line.text(" ").text(noun);
    if subject.is_empty() {
        line
    } else {
        line.text(" ").link(subject, None)
    }
}

/// Append ` in [<project>](<web_url>)`, or nothing when the project is unnamed.
pub(crate) fn with_project(line: Line, project: &Project) -> Line {
    match project.display_name() {
        Some(name) => line
            .text(" in ")
            .link(Line::new().text(name), non_blank(project.web_url.as_deref())),
        None => line,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
