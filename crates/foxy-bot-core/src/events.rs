//! # GitLab Webhook Events
//!
//! Classification of the `X-Gitlab-Event` header and typed views over the
//! webhook payloads the relay understands.
//!
//! Payload structs are lenient: every field is optional and a
//! field carrying an unexpected JSON type is treated as absent. Formatters
//! degrade to omitted text instead of failing.
//!
//! See <https://docs.gitlab.com/ee/user/project/integrations/webhook_events.html>.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Event Classification
// ============================================================================

/// Closed set of event categories the relay distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    MergeRequest,
    Pipeline,
    Comment,
    Issue,
    /// Any label the relay does not handle.
    Unknown,
}

impl EventCategory {
    /// `X-Gitlab-Event` value for merge request events.
    pub const MERGE_REQUEST_LABEL: &'static str = "Merge Request Hook";
    /// `X-Gitlab-Event` value for pipeline events.
    pub const PIPELINE_LABEL: &'static str = "Pipeline Hook";
    /// `X-Gitlab-Event` value for comment events.
    pub const COMMENT_LABEL: &'static str = "Note Hook";
    /// `X-Gitlab-Event` value for issue events.
    pub const ISSUE_LABEL: &'static str = "Issue Hook";

    /// Classify an event-type label by exact, case-sensitive match.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use foxy_bot_core::EventCategory;
    ///
    /// assert_eq!(EventCategory::classify("Issue Hook"), EventCategory::Issue);
    /// assert_eq!(EventCategory::classify("issue hook"), EventCategory::Unknown);
    /// assert_eq!(EventCategory::classify("Deploy Hook"), EventCategory::Unknown);
    /// ```
    pub fn classify(label: &str) -> Self {
        match label {
            Self::MERGE_REQUEST_LABEL => Self::MergeRequest,
            Self::PIPELINE_LABEL => Self::Pipeline,
            Self::COMMENT_LABEL => Self::Comment,
            Self::ISSUE_LABEL => Self::Issue,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MergeRequest => "merge_request",
            Self::Pipeline => "pipeline",
            Self::Comment => "comment",
            Self::Issue => "issue",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Typed Payloads
// ============================================================================

/// A classified webhook delivery with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub category: EventCategory,
    pub payload: EventPayload,
}

impl WebhookEvent {
    /// Classify `label` and read `payload` as the matching variant.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::UnsupportedEvent`] for unknown labels and
    /// [`PayloadError::Malformed`] when the body is not a JSON object.
    pub fn parse(label: &str, payload: &Value) -> Result<Self, PayloadError> {
        let category = EventCategory::classify(label);
        let payload = EventPayload::parse(category, payload)?;
        Ok(Self { category, payload })
    }
}

/// Payload of a webhook delivery, discriminated by [`EventCategory`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    MergeRequest(MergeRequestEvent),
    Pipeline(PipelineEvent),
    Comment(NoteEvent),
    Issue(IssueEvent),
}

impl EventPayload {
    /// Read `payload` as the variant belonging to `category`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::UnsupportedEvent`] for
    /// [`EventCategory::Unknown`] and [`PayloadError::Malformed`] when the
    /// body is not a JSON object.
    pub fn parse(category: EventCategory, payload: &Value) -> Result<Self, PayloadError> {
        if category == EventCategory::Unknown {
            return Err(PayloadError::UnsupportedEvent);
        }

        if !payload.is_object() {
            return Err(PayloadError::Malformed {
                category,
                message: format!("expected a JSON object, got {}", json_type_name(payload)),
            });
        }

        let malformed = |e: serde_json::Error| PayloadError::Malformed {
            category,
            message: e.to_string(),
        };

        Ok(match category {
            EventCategory::MergeRequest => {
                Self::MergeRequest(MergeRequestEvent::deserialize(payload).map_err(malformed)?)
            }
            EventCategory::Pipeline => {
                Self::Pipeline(PipelineEvent::deserialize(payload).map_err(malformed)?)
            }
            EventCategory::Comment => {
                Self::Comment(NoteEvent::deserialize(payload).map_err(malformed)?)
            }
            EventCategory::Issue => {
                Self::Issue(IssueEvent::deserialize(payload).map_err(malformed)?)
            }
            EventCategory::Unknown => return Err(PayloadError::UnsupportedEvent),
        })
    }
}

/// The user who triggered the event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Actor {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
}

impl Actor {
    /// Fallback shown when the payload names nobody.
    pub const ANONYMOUS: &'static str = "Someone";

    /// Display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        non_blank(self.name.as_deref())
            .or_else(|| non_blank(self.username.as_deref()))
            .unwrap_or(Self::ANONYMOUS)
    }
}

/// The project (repository) the event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub path_with_namespace: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub web_url: Option<String>,
}

impl Project {
    /// Display name, falling back to the namespaced path.
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.path_with_namespace.as_deref()))
    }
}

/// A commit as embedded in merge request payloads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Commit {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

/// Body of a `Merge Request Hook` delivery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MergeRequestEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub user: Actor,

    #[serde(default, deserialize_with = "lenient")]
    pub project: Project,

    #[serde(default, deserialize_with = "lenient")]
    pub object_attributes: MergeRequestAttributes,
}

/// Merge request details; also embedded in comment payloads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MergeRequestAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub iid: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub last_commit: Commit,
}

/// Body of a `Pipeline Hook` delivery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PipelineEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub user: Actor,

    #[serde(default, deserialize_with = "lenient")]
    pub project: Project,

    #[serde(default, deserialize_with = "lenient")]
    pub object_attributes: PipelineAttributes,
}

/// Pipeline details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PipelineAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,

    #[serde(rename = "ref", default, deserialize_with = "lenient")]
    pub git_ref: Option<String>,

    /// Elapsed seconds; `null` until the pipeline finishes.
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,

    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl PipelineAttributes {
    /// Link to the pipeline page, preferring the URL GitLab supplies.
    pub fn pipeline_url(&self, project: &Project) -> Option<String> {
        if let Some(url) = non_blank(self.url.as_deref()) {
            return Some(url.to_string());
        }
        let web_url = non_blank(project.web_url.as_deref())?;
        let id = self.id?;
        Some(format!("{}/-/pipelines/{}", web_url.trim_end_matches('/'), id))
    }
}

/// Body of a `Note Hook` delivery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub user: Actor,

    #[serde(default, deserialize_with = "lenient")]
    pub project: Project,

    #[serde(default, deserialize_with = "lenient")]
    pub object_attributes: NoteAttributes,

    /// Present when the note was left on a merge request.
    #[serde(default, deserialize_with = "lenient")]
    pub merge_request: MergeRequestAttributes,
}

/// Comment details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub note: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub noteable_type: Option<String>,

    /// `DiffNote` or `DiscussionNote` for threaded comments; absent or `null`
    /// for overview comments.
    #[serde(rename = "type", default, deserialize_with = "note_kind")]
    pub note_type: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

impl NoteAttributes {
    /// Returns `true` for a top-level comment on the main discussion.
    pub fn is_overview_comment(&self) -> bool {
        self.note_type.is_none()
    }
}

/// Body of an `Issue Hook` delivery.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssueEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub user: Actor,

    #[serde(default, deserialize_with = "lenient")]
    pub project: Project,

    #[serde(default, deserialize_with = "lenient")]
    pub object_attributes: IssueAttributes,
}

/// Issue details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssueAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub iid: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

// ============================================================================
// Sub-case Discriminators
// ============================================================================

/// `object_attributes.action` of a merge request event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRequestAction {
    Open,
    Update,
    Reopen,
    Approved,
    Merge,
    Close,
}

impl MergeRequestAction {
    /// Parse the raw action; unhandled actions (e.g. `unapproved`) yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "open" => Some(Self::Open),
            "update" => Some(Self::Update),
            "reopen" => Some(Self::Reopen),
            "approved" => Some(Self::Approved),
            "merge" => Some(Self::Merge),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

/// `object_attributes.status` of a pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    Failed,
    Running,
    Pending,
}

impl PipelineStatus {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "running" => Some(Self::Running),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// `object_attributes.noteable_type` of a comment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteableType {
    MergeRequest,
    Issue,
    Snippet,
    Commit,
}

impl NoteableType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "MergeRequest" => Some(Self::MergeRequest),
            "Issue" => Some(Self::Issue),
            "Snippet" => Some(Self::Snippet),
            "Commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

/// `object_attributes.action` of an issue event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    Open,
    Close,
    Update,
}

impl IssueAction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Reasons a webhook body cannot be read as a typed payload.
///
/// The dispatch pipeline never surfaces these to callers; they resolve to
/// [`crate::Notification::Empty`] and are logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("Event type is not handled by the relay")]
    UnsupportedEvent,

    #[error("Malformed {category} payload: {message}")]
    Malformed {
        category: EventCategory,
        message: String,
    },
}

// ============================================================================
// Helpers
// ============================================================================

/// Deserialize a field, replacing values of an unexpected shape with the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Deserialize a note `type`: only `null` counts as absent, and a value of
/// any other shape is kept in its JSON form so the note stays non-overview.
fn note_kind<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(kind) => Some(kind),
        other => Some(other.to_string()),
    })
}

/// Treat empty and whitespace-only strings as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
