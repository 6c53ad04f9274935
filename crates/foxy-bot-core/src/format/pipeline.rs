//! Pipeline notifications.
//!
//! | Status | Marker | Headline |
//! |--------|--------|----------|
//! | `success` | ✅ | `Pipeline #id of *project* on *ref* passed in 1m 3s` |
//! | `failed` | ❌ | `Pipeline #id of *project* on *ref* failed after 1m 3s` |
//! | `running` | 🛫 | `Pipeline #id of *project* started on *ref* by *actor*` |
//!
//! `pending` and every other status are not announced: a pipeline reports
//! `pending` and then `running` within seconds, and one start message is
//! enough.

use crate::duration::format_duration;
use crate::events::{non_blank, PipelineEvent, PipelineStatus};
use crate::markdown::{Line, MessageBuilder};
use crate::Notification;
use tracing::debug;

/// Render a `Pipeline Hook` payload.
pub fn format_pipeline(event: &PipelineEvent) -> Notification {
    let attributes = &event.object_attributes;
    let status = attributes
        .status
        .as_deref()
        .and_then(PipelineStatus::from_key);

    let line = match status {
        Some(PipelineStatus::Success) => Line::new().emoji("✅"),
        Some(PipelineStatus::Failed) => Line::new().emoji("❌"),
        Some(PipelineStatus::Running) => Line::new().emoji("🛫"),
        Some(PipelineStatus::Pending) | None => {
            debug!(
                status = ?attributes.status,
                "Pipeline status does not produce a notification"
            );
            return Notification::Empty;
        }
    };

    let pipeline = Line::new().link(
        Line::new().reference('#', attributes.id),
        attributes.pipeline_url(&event.project).as_deref(),
    );
    let mut line = line.text("Pipeline");
    if !pipeline.is_empty() {
        line = line.text(" ").link(pipeline, None);
    }
    if let Some(project) = event.project.display_name() {
        line = line.text(" of ").bold(project);
    }

    let git_ref = non_blank(attributes.git_ref.as_deref());
    let duration = format_duration(attributes.duration);

    let line = match status {
        Some(PipelineStatus::Running) => {
            let line = line.text(" started");
            let line = match git_ref {
                Some(git_ref) => line.text(" on ").bold(git_ref),
                None => line,
            };
            line.text(" by ").bold(event.user.display_name())
        }
        _ => {
            let line = match git_ref {
                Some(git_ref) => line.text(" on ").bold(git_ref),
                None => line,
            };
            let (verb, preposition) = if status == Some(PipelineStatus::Success) {
                ("passed", "in")
            } else {
                ("failed", "after")
            };
            let line = line.text(" ").text(verb);
            if duration.is_empty() {
                line
            } else {
                line.text(" ").text(preposition).text(" ").text(&duration)
            }
        }
    };

    MessageBuilder::new(line).build()
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
