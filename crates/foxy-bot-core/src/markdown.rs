//! # Telegram MarkdownV2 Rendering
//!
//! Escaping and assembly of MarkdownV2 messages.
//!
//! Formatters never concatenate raw strings. They describe a message as a
//! [`MessageBuilder`] made of [`Line`]s, and the [`Line`] segment methods
//! decide what is escaped:
//!
//! | Method | Escaped | Use for |
//! |--------|---------|---------|
//! | [`Line::text`], [`Line::bold`] | yes | titles, names, descriptions, notes |
//! | [`Line::reference`] | sigil only | `#42` / `!7` style references |
//! | [`Line::link`] | label yes, URL no | links to GitLab objects |
//! | [`Line::emoji`] | no | the leading marker of a headline |
//!
//! See <https://core.telegram.org/bots/api#markdownv2-style> for the dialect.

use crate::Notification;
use std::fmt;

/// Characters that must be escaped in MarkdownV2 outside code spans.
///
/// The backslash comes first: it is the escape character itself and must be
/// doubled wherever it appears as content.
pub const RESERVED_CHARACTERS: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

/// Separator between message lines.
const LINE_SEPARATOR: &str = "\n";

/// Escape every reserved MarkdownV2 character in `content`.
///
/// Each reserved character is prefixed with a single backslash. The function
/// is not idempotent: escaping twice escapes the backslashes introduced by
/// the first pass, which is exactly what literal content requires.
///
/// # Examples
///
/// ```rust
/// use foxy_bot_core::escape_markdown;
///
/// assert_eq!(escape_markdown("Foxy.Bot"), r"Foxy\.Bot");
/// assert_eq!(escape_markdown("fix: [WIP] a_b"), r"fix: \[WIP\] a\_b");
/// ```
pub fn escape_markdown(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len() * 2);
    for ch in content.chars() {
        if RESERVED_CHARACTERS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escape optional free text, rendering an absent value as an empty string.
pub fn sanitize(content: Option<&str>) -> String {
    content.map(escape_markdown).unwrap_or_default()
}

// ============================================================================
// Line
// ============================================================================

/// One line of a MarkdownV2 message, assembled from typed segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    rendered: String,
}

impl Line {
    /// Start an empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an emoji marker followed by a space.
    pub fn emoji(mut self, emoji: &'static str) -> Self {
        self.rendered.push_str(emoji);
        self.rendered.push(' ');
        self
    }

    /// Append escaped text.
    pub fn text(mut self, content: &str) -> Self {
        self.rendered.push_str(&escape_markdown(content));
        self
    }

    /// Append escaped text wrapped in bold markers.
    ///
    /// Blank content renders nothing, since `**` is not valid MarkdownV2.
    pub fn bold(mut self, content: &str) -> Self {
        if content.trim().is_empty() {
            return self;
        }
        self.rendered.push('*');
        self.rendered.push_str(&escape_markdown(content));
        self.rendered.push('*');
        self
    }

    /// Append a GitLab-style reference such as `#42` or `!7`.
    ///
    /// The sigil is escaped; the numeric identifier is structural and is
    /// inserted verbatim. An absent identifier renders nothing.
    pub fn reference(mut self, sigil: char, id: Option<u64>) -> Self {
        if let Some(id) = id {
            self.rendered.push_str(&escape_markdown(sigil.encode_utf8(&mut [0; 4])));
            self.rendered.push_str(&id.to_string());
        }
        self
    }

    /// Append `label` as an inline link to `url`.
    ///
    /// The URL is trusted platform data and is inserted verbatim. Without a
    /// URL only the label is rendered; with an empty label the (escaped) URL
    /// doubles as the label.
    pub fn link(mut self, label: Line, url: Option<&str>) -> Self {
        let url = url.filter(|u| !u.is_empty());
        match (label.is_empty(), url) {
            (true, None) => {}
            (false, None) => self.rendered.push_str(&label.rendered),
            (true, Some(url)) => {
                self.rendered
                    .push_str(&format!("[{}]({})", escape_markdown(url), url));
            }
            (false, Some(url)) => {
                self.rendered
                    .push_str(&format!("[{}]({})", label.rendered, url));
            }
        }
        self
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Borrow the rendered MarkdownV2 text.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

// ============================================================================
// MessageBuilder
// ============================================================================

/// Ordered sequence of message lines joined with `\n`.
///
/// A message always starts with a headline. Free-text bodies are added as
/// paragraphs, each separated from what precedes it by a blank line.
///
/// # Examples
///
/// ```rust
/// use foxy_bot_core::{Line, MessageBuilder};
///
/// let message = MessageBuilder::new(Line::new().emoji("🆕").bold("an.le").text(" opened"))
///     .paragraph(Some("Adds *retry*"))
///     .build();
///
/// assert_eq!(message.as_text(), Some("🆕 *an\\.le* opened\n\nAdds \\*retry\\*"));
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    lines: Vec<String>,
}

impl MessageBuilder {
    /// Start a message with its headline.
    pub fn new(headline: Line) -> Self {
        Self {
            lines: vec![headline.rendered],
        }
    }

    /// Append escaped free text as a paragraph after a blank line.
    ///
    /// Absent or whitespace-only text is omitted entirely.
    pub fn paragraph(self, content: Option<&str>) -> Self {
        match content.filter(|c| !c.trim().is_empty()) {
            Some(content) => self.block(Line::new().text(content)),
            None => self,
        }
    }

    /// Append an already assembled line as a paragraph after a blank line.
    pub fn block(mut self, line: Line) -> Self {
        if !line.is_empty() {
            self.lines.push(String::new());
            self.lines.push(line.rendered);
        }
        self
    }

    /// Join the lines into the final notification.
    pub fn build(self) -> Notification {
        Notification::text(self.lines.join(LINE_SEPARATOR))
    }
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod tests;
