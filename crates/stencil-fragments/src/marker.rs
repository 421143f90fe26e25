//! Include marker detection.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `{{`, optional whitespace, `>`, optional whitespace, a path token without
/// whitespace or `}`, optional whitespace, `}}`.
static INCLUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*>\s*([^\s}]+)\s*\}\}").expect("include pattern is a valid regex")
});

/// An include marker found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeMarker<'a> {
    /// Byte range of the whole marker, delimiters included
    pub span: Range<usize>,

    /// Relative path named by the marker
    pub path: &'a str,
}

/// Find the leftmost include marker in `text`.
///
/// Anything that does not match the marker syntax exactly (a missing `>`,
/// unbalanced braces, an empty path) is not a marker and is left alone.
pub fn find_include(text: &str) -> Option<IncludeMarker<'_>> {
    let captures = INCLUDE_PATTERN.captures(text)?;
    let whole = captures.get(0)?;
    let path = captures.get(1)?;

    Some(IncludeMarker {
        span: whole.range(),
        path: path.as_str(),
    })
}
