//! Minimal placeholder templates.
//!
//! Syntax:
//! - `{{name}}`: replaced by the value of `name`, HTML-escaped
//! - `{{{name}}}`: replaced verbatim, for markup the caller built itself
//!
//! Unknown names render as the empty string. Whitespace inside the braces
//! is ignored.

use std::path::Path;

use crate::PageError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Escaped(String),
    Raw(String),
}

/// A parsed template, ready to render many times.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template from a string.
    ///
    /// # Errors
    /// Returns [`PageError::Unterminated`] if a placeholder is not closed.
    pub fn parse(source: &str) -> Result<Self, PageError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_owned()));
            }

            let after = &rest[start..];
            let (open, close) = if after.starts_with("{{{") {
                ("{{{", "}}}")
            } else {
                ("{{", "}}")
            };
            let inner = &after[open.len()..];
            let end = inner
                .find(close)
                .ok_or(PageError::Unterminated(offset + start))?;

            let name = inner[..end].trim().to_owned();
            segments.push(if open == "{{{" {
                Segment::Raw(name)
            } else {
                Segment::Escaped(name)
            });

            let consumed = start + open.len() + end + close.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_owned()));
        }
        Ok(Self { segments })
    }

    /// Reads and parses a template file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PageError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| PageError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "template loaded");
        Self::parse(&source)
    }

    /// Renders the template with the given `(name, value)` pairs.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let lookup = |name: &str| {
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .unwrap_or_default()
        };

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Escaped(name) => out.push_str(&escape_html(lookup(name))),
                Segment::Raw(name) => out.push_str(lookup(name)),
            }
        }
        out
    }
}

/// Escapes the five characters that matter in HTML text and attributes.
pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
