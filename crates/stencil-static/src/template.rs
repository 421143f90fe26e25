//! Base template placeholders.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Replaced by the page title.
pub const TITLE_MARKER: &str = "<!--__TITLE__-->";

/// Replaced by the expanded head fragment.
pub const HEAD_MARKER: &str = "<!--__HEAD__-->";

/// Replaced by the expanded body fragment.
pub const BODY_MARKER: &str = "<!--__BODY__-->";

/// Replaced by the bundled script.
pub const SCRIPT_MARKER: &str = "/*__SCRIPT__*/";

static MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = [TITLE_MARKER, HEAD_MARKER, BODY_MARKER, SCRIPT_MARKER]
        .map(regex::escape)
        .join("|");
    Regex::new(&alternatives).expect("template markers form a valid regex")
});

/// Errors that can occur when loading a base template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Values substituted into a base template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageParts<'a> {
    /// Document title
    pub title: &'a str,
    /// Expanded head HTML (empty when the page has none)
    pub head: &'a str,
    /// Expanded body HTML (empty when the page has none)
    pub body: &'a str,
    /// Script payload
    pub script: &'a str,
}

/// A base page template.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    /// Wrap template text. The script placeholder is required.
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        if !source.contains(SCRIPT_MARKER) {
            return Err(TemplateError::MissingPlaceholder(SCRIPT_MARKER));
        }
        Ok(Self { source })
    }

    /// Substitute every placeholder occurrence in a single pass.
    ///
    /// Substituted text is never scanned again, so a title or fragment that
    /// happens to contain a marker is inserted verbatim. Non-empty head and
    /// body text is followed by a newline.
    pub fn render(&self, parts: &PageParts<'_>) -> String {
        let head = with_newline(parts.head);
        let body = with_newline(parts.body);

        MARKERS
            .replace_all(&self.source, |caps: &Captures<'_>| match &caps[0] {
                TITLE_MARKER => parts.title.to_string(),
                HEAD_MARKER => head.clone(),
                BODY_MARKER => body.clone(),
                _ => parts.script.to_string(),
            })
            .into_owned()
    }
}

fn with_newline(html: &str) -> String {
    if html.is_empty() {
        String::new()
    } else {
        format!("{}\n", html)
    }
}
