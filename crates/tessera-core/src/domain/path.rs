//! Override path parsing.
//!
//! An override path is written as a single string of segments separated by
//! `.`. Keys that legitimately contain a `.` (output file names such as
//! `schema.graphql`) escape it with a backslash:
//!
//! ```text
//! generates.schema\.graphql.documents
//!     → ["generates", "schema.graphql", "documents"]
//! ```
//!
//! ## Escape rules
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `\.`  | literal `.` inside the current segment |
//! | `\\`  | literal `\` inside the current segment |
//! | `\x`  | error: the escape does not escape anything |
//! | trailing `\` | error: dangling escape |
//!
//! Empty input and empty segments (`a..b`, `.a`, `a.`) are rejected too.
//! Parsing happens once, at the call site, so a malformed path fails before
//! any document is touched.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::{DomainError, DomainResult};

pub const DEFAULT_SEPARATOR: char = '.';
pub const DEFAULT_ESCAPE: char = '\\';

/// Separator and escape characters used to read and write path strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSyntax {
    separator: char,
    escape: char,
}

impl PathSyntax {
    /// The `.` / `\` syntax used by every built-in assembler.
    pub const DOTTED: Self = Self {
        separator: DEFAULT_SEPARATOR,
        escape: DEFAULT_ESCAPE,
    };

    pub fn new(separator: char, escape: char) -> DomainResult<Self> {
        if separator == escape {
            return Err(DomainError::InvalidPathSyntax {
                reason: format!("separator and escape are both '{separator}'"),
            });
        }
        Ok(Self { separator, escape })
    }

    pub const fn separator(&self) -> char {
        self.separator
    }

    pub const fn escape(&self) -> char {
        self.escape
    }
}

impl Default for PathSyntax {
    fn default() -> Self {
        Self::DOTTED
    }
}

/// An ordered, non-empty list of raw (unescaped) key segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverridePath {
    segments: Vec<String>,
}

impl OverridePath {
    /// Parse a path string with the default syntax.
    pub fn parse(input: &str) -> DomainResult<Self> {
        Self::parse_with(input, PathSyntax::DOTTED)
    }

    /// Parse a path string, splitting on unescaped separators.
    pub fn parse_with(input: &str, syntax: PathSyntax) -> DomainResult<Self> {
        let malformed = |position: usize, reason: &str| DomainError::MalformedPath {
            path: input.to_string(),
            position,
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(malformed(0, "path is empty"));
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = input.char_indices();

        while let Some((pos, c)) = chars.next() {
            if c == syntax.escape {
                match chars.next() {
                    Some((_, next)) if next == syntax.separator || next == syntax.escape => {
                        current.push(next);
                    }
                    Some((_, next)) => {
                        return Err(malformed(
                            pos,
                            &format!("escape before '{next}' does not escape a separator"),
                        ));
                    }
                    None => return Err(malformed(pos, "dangling escape at end of path")),
                }
            } else if c == syntax.separator {
                if current.is_empty() {
                    return Err(malformed(pos, "empty path segment"));
                }
                segments.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }

        if current.is_empty() {
            return Err(malformed(input.len(), "empty path segment"));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    /// Build a path from raw segments (no escaping involved).
    pub fn from_segments<I, S>(segments: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DomainError::MalformedPath {
                path: String::new(),
                position: 0,
                reason: "path is empty".into(),
            });
        }
        if let Some(index) = segments.iter().position(String::is_empty) {
            return Err(DomainError::MalformedPath {
                path: Self::render(&segments, PathSyntax::DOTTED),
                position: index,
                reason: "empty path segment".into(),
            });
        }
        Ok(Self { segments })
    }

    /// A single-segment path naming one top-level key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty. Keys passed here are compile-time names
    /// chosen by assemblers, not user input.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        assert!(!key.is_empty(), "OverridePath key cannot be empty");
        Self {
            segments: vec![key],
        }
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> DomainResult<Self> {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::from_segments(segments)
    }

    /// Construct from segments already known to be non-empty.
    pub(crate) fn from_trusted(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty() && segments.iter().all(|s| !s.is_empty()));
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into parent segments and the terminal key.
    pub fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }

    /// Render back to an escaped path string.
    pub fn to_string_with(&self, syntax: PathSyntax) -> String {
        Self::render(&self.segments, syntax)
    }

    fn render(segments: &[String], syntax: PathSyntax) -> String {
        segments
            .iter()
            .map(|s| escape_segment_with(s, syntax))
            .collect::<Vec<_>>()
            .join(&syntax.separator.to_string())
    }
}

impl fmt::Display for OverridePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(PathSyntax::DOTTED))
    }
}

impl FromStr for OverridePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Escape a raw key so it can be concatenated into a dotted path string.
///
/// ```rust
/// use tessera_core::domain::escape_segment;
/// assert_eq!(escape_segment("schema.graphql"), "schema\\.graphql");
/// ```
pub fn escape_segment(segment: &str) -> String {
    escape_segment_with(segment, PathSyntax::DOTTED)
}

pub fn escape_segment_with(segment: &str, syntax: PathSyntax) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == syntax.separator || c == syntax.escape {
            out.push(syntax.escape);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(input: &str) -> Vec<String> {
        OverridePath::parse(input).unwrap().segments().to_vec()
    }

    #[test]
    fn splits_on_unescaped_dots() {
        assert_eq!(segments("a.b.c"), ["a", "b", "c"]);
        assert_eq!(segments("single"), ["single"]);
    }

    #[test]
    fn escaped_separator_stays_in_segment() {
        assert_eq!(
            segments("generates.schema\\.graphql.documents"),
            ["generates", "schema.graphql", "documents"]
        );
        assert_eq!(segments("a\\.b\\.c"), ["a.b.c"]);
    }

    #[test]
    fn escaped_escape_is_literal_backslash() {
        assert_eq!(segments("dir\\\\name.x"), ["dir\\name", "x"]);
    }

    #[test]
    fn trailing_escape_is_malformed() {
        let err = OverridePath::parse("a.b\\").unwrap_err();
        match err {
            DomainError::MalformedPath { path, position, .. } => {
                assert_eq!(path, "a.b\\");
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn escape_before_ordinary_char_is_malformed() {
        assert!(matches!(
            OverridePath::parse("a\\b"),
            Err(DomainError::MalformedPath { position: 1, .. })
        ));
    }

    #[test]
    fn empty_segments_are_malformed() {
        for bad in ["", ".a", "a.", "a..b"] {
            assert!(
                OverridePath::parse(bad).is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let path =
            OverridePath::from_segments(["generates", "src/gql.ts", "a\\b.c", "plugins"]).unwrap();
        let text = path.to_string();
        assert_eq!(text, "generates.src/gql\\.ts.a\\\\b\\.c.plugins");
        assert_eq!(OverridePath::parse(&text).unwrap(), path);
    }

    #[test]
    fn custom_syntax() {
        let syntax = PathSyntax::new('/', '~').unwrap();
        let path = OverridePath::parse_with("jobs/build~/test/steps", syntax).unwrap();
        assert_eq!(path.segments(), ["jobs", "build/test", "steps"]);
        assert_eq!(path.to_string_with(syntax), "jobs/build~/test/steps");
    }

    #[test]
    fn syntax_rejects_identical_characters() {
        assert!(PathSyntax::new('.', '.').is_err());
    }

    #[test]
    fn from_segments_rejects_empty() {
        assert!(OverridePath::from_segments(Vec::<String>::new()).is_err());
        assert!(OverridePath::from_segments(["a", ""]).is_err());
    }

    #[test]
    fn split_last_separates_terminal_key() {
        let path = OverridePath::parse("a.b.c").unwrap();
        let (parents, leaf) = path.split_last();
        assert_eq!(parents, ["a", "b"]);
        assert_eq!(leaf, "c");
    }

    #[test]
    fn escape_segment_escapes_dots_and_backslashes() {
        assert_eq!(escape_segment("out.ts"), "out\\.ts");
        assert_eq!(escape_segment("a\\b"), "a\\\\b");
        assert_eq!(escape_segment("plain"), "plain");
    }
}
